/// How recorded samples map onto buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexingMode {
    /// Slot equals the sample index; recording stops once the buffer is full.
    #[default]
    Linear,
    /// Slot is the sample index modulo the capacity; the oldest samples are
    /// overwritten and recording continues. Requires a power-of-two capacity.
    Wrapping,
}

impl IndexingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingMode::Linear => "linear",
            IndexingMode::Wrapping => "wrapping",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScopeConfigError {
    #[error("Capacity must be at least 1")]
    ZeroCapacity,

    #[error("Capacity {capacity} too large (max {max})")]
    CapacityTooLarge { capacity: usize, max: usize },

    #[error("Wrapping mode requires a power-of-two capacity of at least 2, got {capacity}")]
    NotPowerOfTwo { capacity: usize },
}

/// Construction-time options of a scope.
///
/// Hooks whose flag is off are never stored and never fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeConfig {
    pub mode: IndexingMode,
    pub begin_hook: bool,
    pub complete_hook: bool,
    /// Ask the interrupt controller to unbind the handler once the buffer is
    /// full (first wrap in wrapping mode).
    pub auto_stop: bool,
}

impl ScopeConfig {
    /// Linear buffer with both hooks enabled and no auto-stop.
    pub fn linear() -> Self {
        Self {
            mode: IndexingMode::Linear,
            begin_hook: true,
            complete_hook: true,
            auto_stop: false,
        }
    }

    /// Wrapping buffer with both hooks enabled and no auto-stop.
    pub fn wrapping() -> Self {
        Self {
            mode: IndexingMode::Wrapping,
            ..Self::linear()
        }
    }

    pub fn with_begin_hook(mut self, enabled: bool) -> Self {
        self.begin_hook = enabled;
        self
    }

    pub fn with_complete_hook(mut self, enabled: bool) -> Self {
        self.complete_hook = enabled;
        self
    }

    pub fn with_auto_stop(mut self, enabled: bool) -> Self {
        self.auto_stop = enabled;
        self
    }

    pub fn is_wrapping(&self) -> bool {
        self.mode == IndexingMode::Wrapping
    }

    /// Check that `capacity` is usable with this configuration.
    ///
    /// The wrapping recorder folds its index into `[capacity, 2 * capacity)`,
    /// which must stay representable and must keep index parity, hence the
    /// tighter bound and the minimum of 2.
    pub fn validate(&self, capacity: usize) -> Result<(), ScopeConfigError> {
        if capacity == 0 {
            return Err(ScopeConfigError::ZeroCapacity);
        }

        let max = match self.mode {
            IndexingMode::Linear => i32::MAX as usize,
            IndexingMode::Wrapping => i32::MAX as usize / 2,
        };
        if capacity > max {
            return Err(ScopeConfigError::CapacityTooLarge { capacity, max });
        }

        if self.is_wrapping() && (capacity < 2 || !capacity.is_power_of_two()) {
            return Err(ScopeConfigError::NotPowerOfTwo { capacity });
        }

        Ok(())
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self::linear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_accepts_any_capacity() {
        let config = ScopeConfig::linear();
        assert!(config.validate(1).is_ok());
        assert!(config.validate(3).is_ok());
        assert!(config.validate(1000).is_ok());
        assert_eq!(config.validate(0), Err(ScopeConfigError::ZeroCapacity));
    }

    #[test]
    fn test_wrapping_requires_power_of_two() {
        let config = ScopeConfig::wrapping();
        assert!(config.validate(2).is_ok());
        assert!(config.validate(256).is_ok());
        assert_eq!(
            config.validate(6),
            Err(ScopeConfigError::NotPowerOfTwo { capacity: 6 })
        );
        assert_eq!(
            config.validate(1),
            Err(ScopeConfigError::NotPowerOfTwo { capacity: 1 })
        );
    }

    #[test]
    fn test_wrapping_capacity_bound() {
        let config = ScopeConfig::wrapping();
        assert!(matches!(
            config.validate(1 << 30),
            Err(ScopeConfigError::CapacityTooLarge { .. })
        ));
    }

    #[test]
    fn test_builder_flags() {
        let config = ScopeConfig::wrapping()
            .with_begin_hook(false)
            .with_auto_stop(true);
        assert_eq!(config.mode, IndexingMode::Wrapping);
        assert!(!config.begin_hook);
        assert!(config.complete_hook);
        assert!(config.auto_stop);
        assert_eq!(ScopeConfig::default(), ScopeConfig::linear());
    }
}
