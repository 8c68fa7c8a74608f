//! Stage sequencing and the result record.

mod analyzer;
mod events;
mod result;

pub use analyzer::PlaqueAnalyzer;
pub use events::StageEvent;
pub use result::{AnalysisOutcome, AnalysisResult, AnalysisRun, AnalysisStatus, StageFailure};
