//! Contracts for the two external models.

use crate::error::ModelError;
use plaque_core::{BinaryMask, DetectionBox, FrameSize, RgbImageView};
use serde::{Deserialize, Serialize};

/// One tooth-row candidate reported by an [`ObjectLocator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in the locator's inference frame.
    pub bbox: DetectionBox,
    pub confidence: f32,
    #[serde(default)]
    pub class_label: String,
}

/// Everything an [`ObjectLocator`] returns for one photo.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocatorOutput {
    /// Size of the image the model actually ran on.
    ///
    /// Boxes are expressed in this frame. Leave it empty (`0x0`) when boxes
    /// are already in photo coordinates.
    #[serde(default)]
    pub frame: FrameSize,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl LocatorOutput {
    /// Output whose boxes are already in the photo's own coordinates.
    pub fn in_image_frame(detections: Vec<Detection>) -> Self {
        Self {
            frame: FrameSize::default(),
            detections,
        }
    }

    /// Highest-confidence detection at or above `min_confidence`.
    ///
    /// Ties keep the earliest detection.
    pub fn best(&self, min_confidence: f32) -> Option<&Detection> {
        self.detections
            .iter()
            .filter(|d| d.confidence.is_finite() && d.confidence >= min_confidence)
            .fold(None, |best: Option<&Detection>, d| match best {
                Some(b) if b.confidence >= d.confidence => Some(b),
                _ => Some(d),
            })
    }
}

/// Finds the visible row of teeth in a full photograph.
pub trait ObjectLocator: Send + Sync {
    fn detect(&self, image: &RgbImageView<'_>) -> Result<LocatorOutput, ModelError>;
}

/// Splits a tooth-row image into one mask per tooth.
///
/// Masks must be sized to the input image. Their order is treated as stable
/// and becomes the tooth index.
pub trait InstanceSegmenter: Send + Sync {
    fn predict(&self, image: &RgbImageView<'_>) -> Result<Vec<BinaryMask>, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(confidence: f32) -> Detection {
        Detection {
            bbox: DetectionBox::new(0.0, 0.0, 1.0, 1.0),
            confidence,
            class_label: "teeth".into(),
        }
    }

    #[test]
    fn best_picks_highest_confidence_above_floor() {
        let out = LocatorOutput::in_image_frame(vec![det(0.6), det(0.9), det(0.3), det(0.9)]);
        let best = out.best(0.5).expect("some detection");
        assert_eq!(best.confidence, 0.9);
        assert!(std::ptr::eq(best, &out.detections[1]));
        assert!(out.best(0.95).is_none());
    }

    #[test]
    fn locator_output_parses_with_missing_fields() {
        let out: LocatorOutput = serde_json::from_str(
            r#"{ "detections": [ { "bbox": [1, 2, 30, 40], "confidence": 0.8 } ] }"#,
        )
        .expect("parse");
        assert!(out.frame.is_empty());
        assert_eq!(out.detections[0].bbox, DetectionBox::new(1.0, 2.0, 30.0, 40.0));
        assert!(out.detections[0].class_label.is_empty());
    }
}
