use serde::{Deserialize, Serialize};

/// Tunables for the analysis pipeline.
///
/// Every field has a default, so a JSON config may override any subset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Side of the square each tooth crop is resized to before counting.
    pub tooth_target_size: usize,
    /// Side of the rectangular structuring element used for the opening.
    pub morph_kernel: usize,
    /// Plaque cut-off as a fraction of full intensity; darker is plaque.
    pub plaque_threshold_ratio: f32,
    /// Minimum grey level for a pixel to count as part of the tooth at all.
    pub tooth_area_threshold: u8,
    /// Tooth-row detections below this confidence are discarded.
    pub min_confidence: f32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            tooth_target_size: 640,
            morph_kernel: 7,
            plaque_threshold_ratio: 0.7,
            tooth_area_threshold: 1,
            min_confidence: 0.5,
        }
    }
}

impl AnalysisParams {
    /// Absolute grey-level cut-off for plaque classification.
    #[inline]
    pub fn plaque_threshold(&self) -> f32 {
        self.plaque_threshold_ratio * 255.0
    }

    /// Check value ranges; returns a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.tooth_target_size == 0 {
            return Err("tooth_target_size must be positive".into());
        }
        if self.morph_kernel == 0 {
            return Err("morph_kernel must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.plaque_threshold_ratio) {
            return Err(format!(
                "plaque_threshold_ratio must be in [0, 1], got {}",
                self.plaque_threshold_ratio
            ));
        }
        if !self.min_confidence.is_finite() {
            return Err("min_confidence must be finite".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: AnalysisParams =
            serde_json::from_str(r#"{ "morph_kernel": 5 }"#).expect("parse");
        assert_eq!(params.morph_kernel, 5);
        assert_eq!(params.tooth_target_size, 640);
        assert_eq!(params.tooth_area_threshold, 1);
    }

    #[test]
    fn validate_rejects_out_of_range_ratio() {
        let params = AnalysisParams {
            plaque_threshold_ratio: 1.5,
            ..AnalysisParams::default()
        };
        assert!(params.validate().is_err());
        assert!(AnalysisParams::default().validate().is_ok());
    }
}
