use anyhow::Result;

use common::{Config, ConfigLoader};

/// Tunables for a batched search. The defaults match the values the
/// EfficientZero family of agents ships with for Atari.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub pb_c_base: usize,
    pub pb_c_init: f32,
    pub discount_factor: f32,
    pub root_noise_weight: f32,
    pub root_dirichlet_alpha: f32,
    pub value_delta_max: f32,
    pub num_simulations: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            pb_c_base: 19652,
            pb_c_init: 1.25,
            discount_factor: 0.997,
            root_noise_weight: 0.25,
            root_dirichlet_alpha: 0.3,
            value_delta_max: 0.01,
            num_simulations: 50,
        }
    }
}

impl Config for SearchOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            pb_c_base: config.get_usize("pb_c_base").unwrap_or(defaults.pb_c_base),
            pb_c_init: config.get_f32("pb_c_init").unwrap_or(defaults.pb_c_init),
            discount_factor: config
                .get_f32("discount_factor")
                .unwrap_or(defaults.discount_factor),
            root_noise_weight: config
                .get_f32("root_noise_weight")
                .unwrap_or(defaults.root_noise_weight),
            root_dirichlet_alpha: config
                .get_f32("root_dirichlet_alpha")
                .unwrap_or(defaults.root_dirichlet_alpha),
            value_delta_max: config
                .get_f32("value_delta_max")
                .unwrap_or(defaults.value_delta_max),
            num_simulations: config
                .get_usize("num_simulations")
                .unwrap_or(defaults.num_simulations),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();

        assert_eq!(options.pb_c_base, 19652);
        assert_eq!(options.num_simulations, 50);
    }

    #[test]
    fn test_load_from_config_with_fallback_to_defaults() {
        let dir = std::env::temp_dir();
        let path = dir.join("search_options_test.conf");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "atari {{\n  num_simulations: 30\n  discount_factor: 0.995\n}}"
        )
        .unwrap();

        let loader = ConfigLoader::new(&path, "atari".to_string()).unwrap();
        let options: SearchOptions = loader.load().unwrap();

        assert_eq!(options.num_simulations, 30);
        assert_eq!(options.discount_factor, 0.995);
        assert_eq!(options.pb_c_base, 19652);

        std::fs::remove_file(&path).ok();
    }
}
