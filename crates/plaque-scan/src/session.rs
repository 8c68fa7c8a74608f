//! Session directory naming.

use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// `YYYY-MM-DD_HH-MM-SS_<8 hex>`; sortable by time, unique per call.
pub fn session_name(now: DateTime<Utc>, id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("{}_{}", now.format("%Y-%m-%d_%H-%M-%S"), &hex[..8])
}

/// Create a fresh, empty session directory under `parent`.
///
/// `parent` is created if missing. Fails if the chosen name already exists.
pub fn create_session_dir(parent: impl AsRef<Path>) -> io::Result<PathBuf> {
    let parent = parent.as_ref();
    std::fs::create_dir_all(parent)?;
    let dir = parent.join(session_name(Utc::now(), Uuid::new_v4()));
    std::fs::create_dir(&dir)?;
    log::debug!("created session {}", dir.display());
    Ok(dir)
}
