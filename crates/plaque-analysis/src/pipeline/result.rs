use super::events::StageEvent;
use crate::error::{AnalysisError, Stage};
use crate::stages::{AggregateResult, PlaqueMeasurement};
use plaque_core::PixelRect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A stage error tagged with the stage it came from.
#[derive(thiserror::Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: AnalysisError,
}

/// Everything a successful run produced.
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    /// Tooth-row crop in original-photo pixels.
    pub crop: PixelRect,
    pub confidence: f32,
    pub range_image_path: PathBuf,
    pub composite_path: PathBuf,
    /// Per-tooth counts in instance order.
    pub measurements: Vec<PlaqueMeasurement>,
    pub aggregate: AggregateResult,
}

/// Typed result of [`crate::PlaqueAnalyzer::analyze`].
#[derive(Debug)]
pub struct AnalysisRun {
    pub events: Vec<StageEvent>,
    pub outcome: Result<AnalysisOutcome, StageFailure>,
}

impl AnalysisRun {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Flatten into the serialisable record.
    pub fn into_result(self) -> AnalysisResult {
        match self.outcome {
            Ok(outcome) => AnalysisResult::success(&outcome, self.events),
            Err(failure) => AnalysisResult::failure(&failure, self.events),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Ok,
    Error,
}

/// Flat, JSON-friendly record of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub message: String,
    /// Stage that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Machine-readable failure tag, see [`AnalysisError::kind`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Plaque coverage, rounded to two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_teeth_area: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_black_pixels: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teeth_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_image_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_path: Option<PathBuf>,
    #[serde(default)]
    pub events: Vec<StageEvent>,
}

impl AnalysisResult {
    pub fn success(outcome: &AnalysisOutcome, events: Vec<StageEvent>) -> Self {
        let agg = &outcome.aggregate;
        Self {
            status: AnalysisStatus::Ok,
            message: format!(
                "plaque covers {:.2}% of {} teeth",
                agg.rounded_percentage(),
                agg.teeth
            ),
            stage: None,
            error_kind: None,
            percentage: Some(agg.rounded_percentage()),
            total_teeth_area: Some(agg.total_teeth_area),
            total_black_pixels: Some(agg.total_black_pixels),
            teeth_count: Some(agg.teeth),
            range_image_path: Some(outcome.range_image_path.clone()),
            composite_path: Some(outcome.composite_path.clone()),
            events,
        }
    }

    pub fn failure(failure: &StageFailure, events: Vec<StageEvent>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            message: failure.to_string(),
            stage: Some(failure.stage),
            error_kind: Some(failure.error.kind().to_string()),
            percentage: None,
            total_teeth_area: None,
            total_black_pixels: None,
            teeth_count: None,
            range_image_path: None,
            composite_path: None,
            events,
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == AnalysisStatus::Ok
    }
}
