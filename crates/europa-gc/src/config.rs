use crate::error::{GcError, GcResult};

/// Tuning knobs for the collector. There is no generational/concurrent
/// machinery to configure here (the original is a single-threaded,
/// non-moving, non-generational collector, and so is this one) - just the
/// allocation threshold that triggers a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcConfig {
    /// Number of live allocations since the last cycle after which the next
    /// allocation triggers a collection.
    pub collect_threshold: usize,
    /// Multiplier applied to `collect_threshold` after a cycle that freed
    /// less than half the heap, so a workload with a large live set doesn't
    /// collect on every single allocation.
    pub growth_factor: f64,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            collect_threshold: 4096,
            growth_factor: 2.0,
        }
    }
}

impl GcConfig {
    pub fn from_env() -> Self {
        let mut config = GcConfig::default();
        if let Ok(v) = std::env::var("EUROPA_GC_THRESHOLD") {
            if let Ok(n) = v.parse() {
                config.collect_threshold = n;
            }
        }
        config
    }

    pub fn validate(&self) -> GcResult<()> {
        if self.collect_threshold == 0 {
            return Err(GcError::InvalidConfig(
                "collect_threshold must be greater than zero".into(),
            ));
        }
        if self.growth_factor <= 1.0 {
            return Err(GcError::InvalidConfig(
                "growth_factor must be greater than 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GcConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threshold_is_invalid() {
        let config = GcConfig {
            collect_threshold: 0,
            ..GcConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
