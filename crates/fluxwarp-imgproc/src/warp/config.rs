use crate::parallel::ExecutionStrategy;

use super::WarpError;

/// How output pixels that cover missing input are handled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MissingDataPolicy {
    /// Fraction of an output pixel's area that may come from missing input before the output
    /// pixel itself is declared missing. Must lie in `[0, 1]`.
    pub max_missing_fraction: f64,
    /// Write 0 instead of the missing value for output pixels without valid input.
    pub zero_for_missing: bool,
}

impl Default for MissingDataPolicy {
    fn default() -> Self {
        Self {
            max_missing_fraction: 0.8,
            zero_for_missing: false,
        }
    }
}

/// Structure to define the warp job parameters.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::WarpConfig;
///
/// let config = WarpConfig::default()
///     .with_num_threads(4)
///     .with_max_missing_fraction(0.5)
///     .with_force_float(true);
///
/// assert!(config.validate().is_ok());
/// assert!(WarpConfig::default().with_num_threads(0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarpConfig {
    /// Treatment of missing input.
    pub missing: MissingDataPolicy,
    /// Executor of the per-pixel work.
    pub strategy: ExecutionStrategy,
    /// Keep the output as `f64` instead of converting back to the input sample type.
    pub force_float: bool,
}

impl WarpConfig {
    /// Run on a dedicated pool of `n` worker threads.
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.strategy = ExecutionStrategy::Fixed(n);
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the largest tolerated fraction of missing input per output pixel.
    pub fn with_max_missing_fraction(mut self, fraction: f64) -> Self {
        self.missing.max_missing_fraction = fraction;
        self
    }

    /// Write 0 instead of the missing value when an output pixel has no valid input.
    pub fn with_zero_for_missing(mut self, zero: bool) -> Self {
        self.missing.zero_for_missing = zero;
        self
    }

    /// Keep the output as `f64` regardless of the input sample type.
    pub fn with_force_float(mut self, force: bool) -> Self {
        self.force_float = force;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::InvalidConfiguration`] for a missing fraction outside `[0, 1]` or a
    /// zero thread count.
    pub fn validate(&self) -> Result<(), WarpError> {
        let fraction = self.missing.max_missing_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(WarpError::InvalidConfiguration(format!(
                "maximum missing fraction must be in [0, 1], got {fraction}"
            )));
        }
        if self.strategy == ExecutionStrategy::Fixed(0) {
            return Err(WarpError::InvalidConfiguration(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
