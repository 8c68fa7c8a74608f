use super::result::StageFailure;
use crate::error::{AnalysisError, Stage};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// What happened in one stage of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: Stage,
    /// Wall time spent in the stage.
    pub elapsed_ms: f64,
    /// Short human-readable summary, or the error message on failure.
    pub detail: String,
}

/// Run `f` as `stage`, appending one event whether it succeeds or not.
pub(crate) fn timed<T>(
    stage: Stage,
    events: &mut Vec<StageEvent>,
    f: impl FnOnce() -> Result<(T, String), AnalysisError>,
) -> Result<T, StageFailure> {
    let start = Instant::now();
    let res = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    match res {
        Ok((value, detail)) => {
            log::info!("{stage}: {detail} ({elapsed_ms:.1} ms)");
            events.push(StageEvent {
                stage,
                elapsed_ms,
                detail,
            });
            Ok(value)
        }
        Err(error) => {
            events.push(StageEvent {
                stage,
                elapsed_ms,
                detail: format!("failed: {error}"),
            });
            Err(StageFailure { stage, error })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_recorded_and_tagged() {
        let mut events = Vec::new();
        let ok: Result<u8, _> = timed(Stage::Prepare, &mut events, || Ok((7, "ready".into())));
        assert_eq!(ok.expect("prepare"), 7);

        let err = timed::<()>(Stage::LocateRange, &mut events, || {
            Err(AnalysisError::NoDetection)
        })
        .unwrap_err();

        assert_eq!(err.stage, Stage::LocateRange);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].detail, "ready");
        assert!(events[1].detail.starts_with("failed: "));
        assert!(events.iter().all(|e| e.elapsed_ms >= 0.0));
    }
}
