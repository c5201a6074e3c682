/// Running min/max bounds used to normalize value estimates into a
/// comparable range. One instance per search tree.
///
/// `value_delta_max` is a floor on the normalization span: while the
/// observed spread is positive but smaller than the floor, values are
/// divided by the floor instead, which keeps early-search scores from
/// being stretched across a tiny interval.
#[derive(Clone, Debug)]
pub struct MinMaxStats {
    maximum: f32,
    minimum: f32,
    value_delta_max: f32,
}

impl MinMaxStats {
    pub fn new(value_delta_max: f32) -> Self {
        Self {
            maximum: f32::NEG_INFINITY,
            minimum: f32::INFINITY,
            value_delta_max,
        }
    }

    pub fn set_delta(&mut self, value_delta_max: f32) {
        self.value_delta_max = value_delta_max;
    }

    pub fn update(&mut self, value: f32) {
        self.maximum = self.maximum.max(value);
        self.minimum = self.minimum.min(value);
    }

    pub fn clear(&mut self) {
        self.maximum = f32::NEG_INFINITY;
        self.minimum = f32::INFINITY;
    }

    /// With no observations yet the raw value passes through unchanged.
    pub fn normalize(&self, value: f32) -> f32 {
        let delta = self.maximum - self.minimum;

        if delta > 0.0 {
            if delta < self.value_delta_max {
                (value - self.minimum) / self.value_delta_max
            } else {
                (value - self.minimum) / delta
            }
        } else {
            value
        }
    }
}

impl Default for MinMaxStats {
    fn default() -> Self {
        Self::new(0.01)
    }
}

/// One `MinMaxStats` per root tree in a batch.
#[derive(Clone, Debug)]
pub struct MinMaxStatsList {
    stats: Vec<MinMaxStats>,
}

impl MinMaxStatsList {
    pub fn new(num: usize) -> Self {
        Self {
            stats: vec![MinMaxStats::default(); num],
        }
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn set_delta(&mut self, value_delta_max: f32) {
        for stats in self.stats.iter_mut() {
            stats.set_delta(value_delta_max);
        }
    }

    pub fn get(&self, index: usize) -> &MinMaxStats {
        &self.stats[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut MinMaxStats {
        &mut self.stats[index]
    }
}
