//! The four pipeline stages.
//!
//! Each stage is a small struct borrowing its collaborators; the
//! orchestrator in [`crate::pipeline`] runs them in order.

mod aggregate;
mod plaque;
mod range;
mod teeth;

pub use aggregate::{aggregate, AggregateResult, ResultAggregator};
pub use plaque::{PlaqueMeasurement, PlaqueQuantifier, ToothPlaque};
pub use range::{ToothRangeLocator, ToothRangeResult};
pub use teeth::{SegmentedTeeth, ToothInstance, ToothSegmenter};

pub(crate) use aggregate::persist_composite;
