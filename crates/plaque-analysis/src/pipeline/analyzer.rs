use super::events::{timed, StageEvent};
use super::result::{AnalysisOutcome, AnalysisResult, AnalysisRun, StageFailure};
use crate::codec::save_gray;
use crate::error::Stage;
use crate::model::{InstanceSegmenter, ObjectLocator};
use crate::params::AnalysisParams;
use crate::session::AnalysisSession;
use crate::stages::{
    persist_composite, PlaqueQuantifier, ResultAggregator, ToothRangeLocator, ToothSegmenter,
};
use crate::store::BlobStore;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Runs the full pipeline for one session at a time.
///
/// Holds no per-session state, so a single analyzer can serve concurrent
/// sessions as long as each has its own directory.
pub struct PlaqueAnalyzer {
    locator: Box<dyn ObjectLocator>,
    segmenter: Box<dyn InstanceSegmenter>,
    store: Box<dyn BlobStore>,
    params: AnalysisParams,
}

impl PlaqueAnalyzer {
    pub fn new(
        locator: impl ObjectLocator + 'static,
        segmenter: impl InstanceSegmenter + 'static,
        store: impl BlobStore + 'static,
        params: AnalysisParams,
    ) -> Self {
        Self {
            locator: Box::new(locator),
            segmenter: Box::new(segmenter),
            store: Box::new(store),
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    #[inline]
    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// Analyze the session rooted at `root` and flatten the outcome.
    pub fn run(&self, root: impl AsRef<Path>) -> AnalysisResult {
        self.analyze(&AnalysisSession::new(root.as_ref()))
            .into_result()
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// Artifacts written before a failure are left in place.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(root = %session.root().display()))
    )]
    pub fn analyze(&self, session: &AnalysisSession) -> AnalysisRun {
        let mut events = Vec::new();
        let outcome = self.run_stages(session, &mut events);
        match &outcome {
            Ok(o) => log::info!(
                "session {} done: {:.2}% plaque over {} teeth",
                session.root().display(),
                o.aggregate.rounded_percentage(),
                o.aggregate.teeth
            ),
            Err(failure) => log::error!("session {}: {failure}", session.root().display()),
        }
        AnalysisRun { events, outcome }
    }

    fn run_stages(
        &self,
        session: &AnalysisSession,
        events: &mut Vec<StageEvent>,
    ) -> Result<AnalysisOutcome, StageFailure> {
        let store = self.store.as_ref();

        timed(Stage::Prepare, events, || {
            for dir in session.working_dirs() {
                store.reset_dir(&dir)?;
            }
            for output in session.run_outputs() {
                store.remove(&output)?;
            }
            Ok(((), "working folders and outputs reset".to_string()))
        })?;

        let range = timed(Stage::LocateRange, events, || {
            let range = ToothRangeLocator::new(self.locator.as_ref(), store, &self.params)
                .locate(session)?;
            let size = range.size();
            let detail = format!("{size} crop, confidence {:.2}", range.confidence);
            Ok((range, detail))
        })?;

        let teeth = timed(Stage::SegmentTeeth, events, || {
            let teeth = ToothSegmenter::new(self.segmenter.as_ref(), store, &self.params)
                .segment(session)?;
            let detail = format!("{} teeth", teeth.len());
            Ok((teeth, detail))
        })?;

        let (aggregator, measurements) = timed(Stage::QuantifyPlaque, events, || {
            let quantifier = PlaqueQuantifier::new(&self.params);
            let mut aggregator = ResultAggregator::new(teeth.range_size);
            let mut measurements = Vec::with_capacity(teeth.len());
            for tooth in &teeth.instances {
                let plaque = quantifier.measure(&tooth.crop.view(), &tooth.resized.view());
                save_gray(store, &session.tooth_processed(tooth.index), &plaque.resized_mask)?;
                log::debug!(
                    "tooth {}: area={} plaque={}",
                    tooth.index,
                    plaque.measurement.tooth_area,
                    plaque.measurement.black_pixel_count
                );
                aggregator.add(&tooth.rect, &plaque.mask.view(), &plaque.measurement);
                measurements.push(plaque.measurement);
            }
            let detail = format!("{} teeth measured", measurements.len());
            Ok(((aggregator, measurements), detail))
        })?;

        let (aggregate, composite_path) = timed(Stage::Aggregate, events, || {
            let aggregate = aggregator.finish()?;
            let path = persist_composite(store, session, &aggregate)?;
            let detail = format!(
                "{} / {} pixels, {:.2}%",
                aggregate.total_black_pixels,
                aggregate.total_teeth_area,
                aggregate.rounded_percentage()
            );
            Ok(((aggregate, path), detail))
        })?;

        Ok(AnalysisOutcome {
            crop: range.crop,
            confidence: range.confidence,
            range_image_path: range.path,
            composite_path,
            measurements,
            aggregate,
        })
    }
}
