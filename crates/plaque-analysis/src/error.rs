use plaque_core::{DetectionBox, FrameSize, MaskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage, used to tag events and failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Working-folder reset.
    Prepare,
    LocateRange,
    SegmentTeeth,
    QuantifyPlaque,
    Aggregate,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Prepare => "prepare",
            Stage::LocateRange => "locate_range",
            Stage::SegmentTeeth => "segment_teeth",
            Stage::QuantifyPlaque => "quantify_plaque",
            Stage::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by a [`crate::BlobStore`].
#[derive(thiserror::Error, Debug)]
pub enum BlobError {
    #[error("blob not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("blob i/o failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by an external model call.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("malformed model output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("failed to encode model input: {0}")]
    Input(#[from] image::ImageError),
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error("{0}")]
    Other(String),
}

/// Errors returned by the analysis stages.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("failed to decode image {}: {reason}", .path.display())]
    ImageDecode { path: PathBuf, reason: String },
    #[error("failed to encode image {}: {reason}", .path.display())]
    ImageEncode { path: PathBuf, reason: String },
    #[error("object locator found no tooth range")]
    NoDetection,
    #[error("tooth range box {bbox} is empty after clamping to the photo")]
    DegenerateRange { bbox: DetectionBox },
    #[error("mask {index} is {mask}, range image is {image}")]
    MaskSizeMismatch {
        index: usize,
        mask: FrameSize,
        image: FrameSize,
    },
    #[error("mask {index} has no foreground pixels")]
    EmptyMask { index: usize },
    #[error(
        "division by zero: total tooth area is 0 \
         ({teeth} teeth, {total_black_pixels} plaque pixels)"
    )]
    DivisionByZero {
        teeth: usize,
        total_black_pixels: u64,
    },
    #[error("{model} failed: {source}")]
    ExternalModel {
        model: &'static str,
        #[source]
        source: ModelError,
    },
    #[error(transparent)]
    Storage(#[from] BlobError),
}

impl AnalysisError {
    /// Stable machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::ImageDecode { .. } => "image_decode",
            AnalysisError::ImageEncode { .. } => "image_encode",
            AnalysisError::NoDetection => "no_detection",
            AnalysisError::DegenerateRange { .. } => "degenerate_range",
            AnalysisError::MaskSizeMismatch { .. } => "mask_size_mismatch",
            AnalysisError::EmptyMask { .. } => "empty_mask",
            AnalysisError::DivisionByZero { .. } => "division_by_zero",
            AnalysisError::ExternalModel { .. } => "external_model",
            AnalysisError::Storage(_) => "storage",
        }
    }
}
