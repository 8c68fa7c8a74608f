//! End-to-end helpers: photo file in, session directory and report out.

use crate::session::create_session_dir;
use plaque_analysis::{
    decode_rgb, encode_rgb_png, AnalysisIoError, AnalysisResult, AnalysisSession, BlobError,
    BlobStore, PlaqueAnalyzer,
};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Report written into every session directory.
pub const REPORT_FILE: &str = "report.json";

/// Errors produced by the facade helpers.
///
/// A pipeline failure is not one of them: it comes back as an
/// [`AnalysisResult`] with `status = error`.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("failed to read photo {}: {source}", .path.display())]
    ReadPhoto {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode photo {}: {source}", .path.display())]
    DecodePhoto {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create session directory: {0}")]
    Session(#[source] std::io::Error),

    #[error("failed to encode photo: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Storage(#[from] BlobError),

    #[error("failed to write report: {0}")]
    Report(#[from] AnalysisIoError),

    #[error("session directory {} does not exist", .0.display())]
    MissingSession(PathBuf),
}

/// Outcome of one helper call.
#[derive(Clone, Debug)]
pub struct ScanReport {
    pub session_dir: PathBuf,
    pub report_path: PathBuf,
    pub result: AnalysisResult,
}

/// Store `photo` as the session's original image, turned upright and re-encoded as PNG.
pub fn store_photo(
    analyzer: &PlaqueAnalyzer,
    session: &AnalysisSession,
    photo: &Path,
) -> Result<(), ScanError> {
    let bytes = fs::read(photo).map_err(|source| ScanError::ReadPhoto {
        path: photo.to_path_buf(),
        source,
    })?;
    let image = decode_rgb(&bytes).map_err(|source| ScanError::DecodePhoto {
        path: photo.to_path_buf(),
        source,
    })?;
    log::info!("photo {} is {}", photo.display(), image.size());
    analyzer
        .store()
        .write(&session.original_image(), &encode_rgb_png(&image)?)?;
    Ok(())
}

fn finish(analyzer: &PlaqueAnalyzer, session_dir: PathBuf) -> Result<ScanReport, ScanError> {
    let result = analyzer.run(&session_dir);
    let report_path = session_dir.join(REPORT_FILE);
    result.write_json(&report_path)?;
    Ok(ScanReport {
        session_dir,
        report_path,
        result,
    })
}

/// Create a new session under `sessions_root`, store `photo` in it and run
/// the pipeline.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(photo = %photo.as_ref().display()))
)]
pub fn analyze_photo(
    analyzer: &PlaqueAnalyzer,
    photo: impl AsRef<Path>,
    sessions_root: impl AsRef<Path>,
) -> Result<ScanReport, ScanError> {
    let session_dir = create_session_dir(sessions_root).map_err(ScanError::Session)?;
    let session = AnalysisSession::new(&session_dir);
    store_photo(analyzer, &session, photo.as_ref())?;
    finish(analyzer, session_dir)
}

/// Run the pipeline again on an existing session directory.
pub fn rerun_session(
    analyzer: &PlaqueAnalyzer,
    session_dir: impl AsRef<Path>,
) -> Result<ScanReport, ScanError> {
    let session_dir = session_dir.as_ref().to_path_buf();
    if !session_dir.is_dir() {
        return Err(ScanError::MissingSession(session_dir));
    }
    finish(analyzer, session_dir)
}
