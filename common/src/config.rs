use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use hocon::{Hocon, HoconLoader};
use log::warn;

/// Loads typed option structs from a HOCON file.
///
/// Lookup order for a key: process environment, then the scoped section
/// (e.g. a per-environment block like `atari { ... }`), then the document
/// root.
#[derive(Debug)]
pub struct ConfigLoader {
    hocon: Hocon,
    env: HashMap<String, String>,
    scope: String,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>, scope: String) -> Result<Self> {
        let path = path.as_ref();

        let hocon = HoconLoader::new()
            .load_file(path)
            .with_context(|| format!("Failed to find or load config file at: {:?}", path))?
            .hocon()?;

        let env = std::env::vars().collect::<HashMap<_, _>>();

        Ok(Self { hocon, env, scope })
    }

    pub fn load<T: Config>(&self) -> Result<T> {
        T::load(self)
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        if let Some(value) = self.env.get(name) {
            return value.parse::<f32>().ok();
        }

        match self.lookup(name) {
            Hocon::Real(value) => Some(*value as f32),
            Hocon::Integer(value) => Some(*value as f32),
            Hocon::String(value) => value.parse::<f32>().ok(),
            _ => None,
        }
    }

    pub fn get_usize(&self, name: &str) -> Option<usize> {
        if let Some(value) = self.env.get(name) {
            return value.parse::<usize>().ok();
        }

        match self.lookup(name) {
            Hocon::Integer(value) => usize::try_from(*value).ok(),
            Hocon::String(value) => value.parse::<usize>().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        if let Some(value) = self.env.get(name) {
            return value.parse::<bool>().ok();
        }

        match self.lookup(name) {
            Hocon::Boolean(value) => Some(*value),
            Hocon::String(value) => value.parse::<bool>().ok(),
            _ => None,
        }
    }

    fn lookup(&self, name: &str) -> &Hocon {
        let scoped = &self.hocon[self.scope.as_str()];

        if matches!(scoped, Hocon::Hash(_)) {
            let value = &scoped[name];
            if !matches!(value, Hocon::BadValue(_)) {
                return value;
            }
        } else if !self.scope.is_empty() {
            warn!("Config scope {:?} is not an object", self.scope);
        }

        &self.hocon[name]
    }
}

pub trait Config {
    fn load(config: &ConfigLoader) -> Result<Self>
    where
        Self: Sized;
}
