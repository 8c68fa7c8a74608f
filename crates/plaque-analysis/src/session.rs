//! Session directory layout.

use std::path::{Path, PathBuf};

const ORIGINAL_IMAGE: &str = "original_image.png";
const RANGE_IMAGE: &str = "teeth_range.png";
const COMPOSITE_IMAGE: &str = "teeth_range_detect.png";
const TEETH_DIR: &str = "teeth";
const TEETH_DETECT_DIR: &str = "teeth-detect";

/// One analysis run rooted at a caller-owned directory.
///
/// The caller creates the directory (one per photograph) and places the
/// photo at [`AnalysisSession::original_image`]; every artifact the pipeline
/// produces lives under the same root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisSession {
    root: PathBuf,
}

impl AnalysisSession {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn original_image(&self) -> PathBuf {
        self.root.join(ORIGINAL_IMAGE)
    }

    /// Cropped tooth row.
    pub fn range_image(&self) -> PathBuf {
        self.root.join(RANGE_IMAGE)
    }

    /// Whole-mouth plaque mask.
    pub fn composite_image(&self) -> PathBuf {
        self.root.join(COMPOSITE_IMAGE)
    }

    pub fn teeth_dir(&self) -> PathBuf {
        self.root.join(TEETH_DIR)
    }

    pub fn teeth_detect_dir(&self) -> PathBuf {
        self.root.join(TEETH_DETECT_DIR)
    }

    /// Folders cleared at the start of every run.
    pub fn working_dirs(&self) -> [PathBuf; 2] {
        [self.teeth_dir(), self.teeth_detect_dir()]
    }

    /// Whole-run outputs in the session root, removed at the start of every run.
    pub fn run_outputs(&self) -> [PathBuf; 2] {
        [self.range_image(), self.composite_image()]
    }

    /// Bounding-rectangle crop of tooth `index`.
    pub fn tooth_crop(&self, index: usize) -> PathBuf {
        self.teeth_dir().join(format!("tooth_{index}.png"))
    }

    /// Thresholded resized crop of tooth `index`.
    pub fn tooth_processed(&self, index: usize) -> PathBuf {
        self.teeth_detect_dir()
            .join(format!("tooth_{index}_imgr.png"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_live_under_root() {
        let s = AnalysisSession::new("/tmp/session-1");
        assert_eq!(s.range_image(), Path::new("/tmp/session-1/teeth_range.png"));
        assert_eq!(
            s.tooth_crop(3),
            Path::new("/tmp/session-1/teeth/tooth_3.png")
        );
        assert_eq!(
            s.tooth_processed(0),
            Path::new("/tmp/session-1/teeth-detect/tooth_0_imgr.png")
        );
    }
}
