use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_BLUR_LEVEL, DEFAULT_ITERATIONS, DEFAULT_MASK_SIZE, DEFAULT_WORKER_COUNT,
};

use super::blur_error::BlurError;

/// Shape of the 1D mask applied along each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskProfile {
    /// Sampled Gaussian with sigma derived from mask size and blur level.
    #[default]
    Gaussian,
    /// Row of Pascal's triangle. Ignores blur level.
    Binomial,
}

/// Parameters of one blur run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    pub mask_size: usize,
    pub blur_level: f64,
    pub iteration_count: usize,
    pub worker_count: usize,
    pub profile: MaskProfile,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            mask_size: DEFAULT_MASK_SIZE,
            blur_level: DEFAULT_BLUR_LEVEL,
            iteration_count: DEFAULT_ITERATIONS,
            worker_count: DEFAULT_WORKER_COUNT,
            profile: MaskProfile::default(),
        }
    }
}

impl BlurConfig {
    pub fn validate(&self) -> Result<(), BlurError> {
        validate_mask(self.mask_size, self.blur_level)?;
        if self.iteration_count == 0 {
            return Err(BlurError::InvalidConfiguration(
                "iteration count must be at least 1".into(),
            ));
        }
        if self.worker_count == 0 {
            return Err(BlurError::InvalidConfiguration(
                "worker count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Checks the parameters every worker needs to build its mask.
pub fn validate_mask(mask_size: usize, blur_level: f64) -> Result<(), BlurError> {
    if mask_size == 0 || mask_size % 2 == 0 {
        return Err(BlurError::InvalidConfiguration(format!(
            "mask size must be a positive odd integer, got {mask_size}"
        )));
    }
    if !blur_level.is_finite() || blur_level <= 0.0 {
        return Err(BlurError::InvalidConfiguration(format!(
            "blur level must be positive, got {blur_level}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(mask_size: usize, blur_level: f64, iterations: usize, workers: usize) -> BlurConfig {
        BlurConfig {
            mask_size,
            blur_level,
            iteration_count: iterations,
            worker_count: workers,
            profile: MaskProfile::Gaussian,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = BlurConfig::default();
        assert_eq!(config.mask_size, 3);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.iteration_count, 1);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::even_mask(config(4, 1.0, 1, 1))]
    #[case::zero_mask(config(0, 1.0, 1, 1))]
    #[case::zero_blur_level(config(3, 0.0, 1, 1))]
    #[case::negative_blur_level(config(3, -1.0, 1, 1))]
    #[case::nan_blur_level(config(3, f64::NAN, 1, 1))]
    #[case::no_iterations(config(3, 1.0, 0, 1))]
    #[case::no_workers(config(3, 1.0, 1, 0))]
    fn test_invalid_configs_rejected(#[case] config: BlurConfig) {
        assert!(matches!(
            config.validate(),
            Err(BlurError::InvalidConfiguration(_))
        ));
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(51)]
    fn test_odd_masks_accepted(#[case] mask_size: usize) {
        assert!(config(mask_size, 1.0, 1, 1).validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BlurConfig =
            serde_json::from_str(r#"{"mask_size": 7, "profile": "binomial"}"#).unwrap();
        assert_eq!(config.mask_size, 7);
        assert_eq!(config.profile, MaskProfile::Binomial);
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.iteration_count, 1);
    }
}
