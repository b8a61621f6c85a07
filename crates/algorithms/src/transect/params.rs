//! Pipeline configuration

use crate::statistics::{FIELD_CIRCULAR_VARIANCE, FIELD_DIRECTION_MEAN, FIELD_MEAN_X, FIELD_MEAN_Y};
use transectaz_core::io::OUTPUT_SUFFIX;
use transectaz_core::map::LayerPosition;
use transectaz_core::{Error, Result};

/// International foot per meter
pub const METERS_TO_FEET: f64 = 3.28084;

/// Default identifier field of transect datasets
pub const DEFAULT_ID_FIELD: &str = "Id";

/// Tie-breaking rule when rounding directions to whole degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// 0.5 rounds away from zero (112.5 -> 113)
    #[default]
    HalfAwayFromZero,
    /// 0.5 rounds to the even neighbour (112.5 -> 112)
    HalfEven,
}

impl RoundingMode {
    pub fn round(&self, value: f64) -> f64 {
        match self {
            RoundingMode::HalfAwayFromZero => value.round(),
            RoundingMode::HalfEven => value.round_ties_even(),
        }
    }
}

/// Parameters for [`TransectAzimuthPipeline`](super::TransectAzimuthPipeline)
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    /// Field that receives sequential identifiers and groups the statistic
    pub id_field: String,
    /// Appended to the input stem to name the output dataset
    pub output_suffix: String,
    /// Treat lines as undirected when averaging
    pub orientation_only: bool,
    pub rounding: RoundingMode,
    /// Multiplier applied to mean lengths (meters to feet by default)
    pub length_factor: f64,
    /// Statistic fields removed from the output
    pub pruned_fields: Vec<String>,
    /// Where the output goes in the map's layer stack
    pub layer_position: LayerPosition,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            output_suffix: OUTPUT_SUFFIX.to_string(),
            orientation_only: false,
            rounding: RoundingMode::default(),
            length_factor: METERS_TO_FEET,
            pruned_fields: [
                FIELD_DIRECTION_MEAN,
                FIELD_CIRCULAR_VARIANCE,
                FIELD_MEAN_X,
                FIELD_MEAN_Y,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            layer_position: LayerPosition::Top,
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<()> {
        if self.id_field.trim().is_empty() {
            return Err(Error::InvalidParameter {
                name: "id_field",
                value: self.id_field.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.output_suffix.is_empty() {
            return Err(Error::InvalidParameter {
                name: "output_suffix",
                value: String::new(),
                reason: "output would overwrite the input".to_string(),
            });
        }
        if !self.length_factor.is_finite() || self.length_factor <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "length_factor",
                value: self.length_factor.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_modes() {
        assert_eq!(RoundingMode::HalfAwayFromZero.round(112.5), 113.0);
        assert_eq!(RoundingMode::HalfEven.round(112.5), 112.0);
        assert_eq!(RoundingMode::HalfEven.round(113.5), 114.0);
        assert_eq!(RoundingMode::HalfAwayFromZero.round(44.49), 44.0);
    }

    #[test]
    fn test_defaults_validate() {
        let params = PipelineParams::default();
        params.validate().unwrap();
        assert_eq!(params.id_field, "Id");
        assert_eq!(params.output_suffix, "_az");
        assert_eq!(params.pruned_fields, vec!["DirMean", "CirVar", "AveX", "AveY"]);
    }

    #[test]
    fn test_rejects_bad_factor() {
        let params = PipelineParams {
            length_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidParameter { name: "length_factor", .. })
        ));
    }
}
