//! Dental plaque coverage analysis.
//!
//! One photograph of a patient's teeth goes through four stages:
//! - locate the visible tooth row with an object locator and crop it,
//! - split the row into per-tooth crops with an instance segmenter,
//! - classify plaque pixels on each tooth after brightness flattening,
//! - aggregate into a whole-mouth percentage and a composite mask image.
//!
//! The two models and the storage backend are traits ([`ObjectLocator`],
//! [`InstanceSegmenter`], [`BlobStore`]) so the numeric pipeline runs the same
//! against real models, out-of-process adapters, or deterministic stubs.
//!
//! ```no_run
//! use plaque_analysis::{
//!     AnalysisParams, CommandSpec, FsBlobStore, PlaqueAnalyzer, ProcessLocator,
//!     ProcessSegmenter,
//! };
//!
//! let analyzer = PlaqueAnalyzer::new(
//!     ProcessLocator::new(CommandSpec::new("locate-teeth")),
//!     ProcessSegmenter::new(CommandSpec::new("segment-teeth")),
//!     FsBlobStore,
//!     AnalysisParams::default(),
//! );
//! let result = analyzer.run("/var/lib/plaque/sessions/2024-05-01_12-00-00_ab12cd34");
//! println!("{}", result.message);
//! ```

mod codec;
mod error;
mod io;
mod model;
mod params;
mod pipeline;
mod process;
mod session;
mod stages;
mod store;

pub use codec::{decode_rgb, encode_gray_png, encode_rgb_png, load_gray, load_rgb};
pub use error::{AnalysisError, BlobError, ModelError, Stage};
pub use io::{AnalysisConfig, AnalysisIoError, ConfigError};
pub use model::{Detection, InstanceSegmenter, LocatorOutput, ObjectLocator};
pub use params::AnalysisParams;
pub use pipeline::{
    AnalysisOutcome, AnalysisResult, AnalysisRun, AnalysisStatus, PlaqueAnalyzer, StageEvent,
    StageFailure,
};
pub use process::{CommandSpec, MaskRle, ProcessLocator, ProcessSegmenter, SegmenterOutput};
pub use session::AnalysisSession;
pub use stages::{
    aggregate, AggregateResult, PlaqueMeasurement, PlaqueQuantifier, ResultAggregator,
    SegmentedTeeth, ToothInstance, ToothPlaque, ToothRangeLocator, ToothRangeResult,
    ToothSegmenter,
};
pub use store::{BlobStore, FsBlobStore, MemoryBlobStore};
