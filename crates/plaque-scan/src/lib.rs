//! High-level facade crate for the `plaque-*` workspace.
//!
//! This crate provides:
//! - re-exports of the raster primitives (`plaque_scan::core`) and the
//!   analysis pipeline (`plaque_scan::analysis`)
//! - session directory creation with collision-resistant names
//! - end-to-end helpers that take a photo file, run the pipeline and write a
//!   JSON report next to the artifacts
//! - the `plaque-scan` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use plaque_scan::analysis::{AnalysisConfig, FsBlobStore};
//! use plaque_scan::scan::analyze_photo;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::load_json("plaque.json")?;
//! let analyzer = config.build_analyzer(FsBlobStore)?;
//! let report = analyze_photo(&analyzer, "patient.jpg", config.output_dir())?;
//! println!("{}", report.result.message);
//! # Ok(())
//! # }
//! ```

pub use plaque_analysis as analysis;
pub use plaque_core as core;

pub use plaque_analysis::{
    AnalysisConfig, AnalysisParams, AnalysisResult, AnalysisSession, AnalysisStatus,
    PlaqueAnalyzer, Stage,
};

pub mod scan;
pub mod session;

pub use scan::{analyze_photo, rerun_session, ScanError, ScanReport, REPORT_FILE};
pub use session::create_session_dir;
