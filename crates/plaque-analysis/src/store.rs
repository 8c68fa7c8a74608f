//! Byte storage addressed by path.

use crate::error::BlobError;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Read/write-by-path storage for session artifacts.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, creating parent folders as needed.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), BlobError>;

    /// Fetch the bytes at `path`; [`BlobError::NotFound`] when absent.
    fn read(&self, path: &Path) -> Result<Vec<u8>, BlobError>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove everything under `dir` and leave it as an empty folder.
    fn reset_dir(&self, dir: &Path) -> Result<(), BlobError>;

    /// Delete the blob at `path`; absent blobs are not an error.
    fn remove(&self, path: &Path) -> Result<(), BlobError>;
}

impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), BlobError> {
        (**self).write(path, bytes)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, BlobError> {
        (**self).read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn reset_dir(&self, dir: &Path) -> Result<(), BlobError> {
        (**self).reset_dir(dir)
    }

    fn remove(&self, path: &Path) -> Result<(), BlobError> {
        (**self).remove(path)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BlobError {
    BlobError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Local-disk store; paths are used as given.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsBlobStore;

impl BlobStore for FsBlobStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), BlobError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(path, bytes).map_err(|e| io_error(path, e))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, BlobError> {
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BlobError::NotFound(path.to_path_buf()),
            _ => io_error(path, e),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn reset_dir(&self, dir: &Path) -> Result<(), BlobError> {
        match fs::remove_dir_all(dir) {
            Ok(()) => log::debug!("removed {}", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(dir, e)),
        }
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))
    }

    fn remove(&self, path: &Path) -> Result<(), BlobError> {
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path, e)),
        }
    }
}

/// In-process store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every stored path, in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), BlobError> {
        self.lock().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, BlobError> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(path.to_path_buf()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn reset_dir(&self, dir: &Path) -> Result<(), BlobError> {
        self.lock().retain(|p, _| !p.starts_with(dir));
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), BlobError> {
        self.lock().remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_reset_only_touches_the_folder() {
        let store = MemoryBlobStore::new();
        store.write(Path::new("/s/teeth/tooth_0.png"), b"a").expect("write");
        store.write(Path::new("/s/teeth-detect/x.png"), b"b").expect("write");
        store.write(Path::new("/s/teeth_range.png"), b"c").expect("write");

        store.reset_dir(Path::new("/s/teeth")).expect("reset");

        assert!(!store.exists(Path::new("/s/teeth/tooth_0.png")));
        assert!(store.exists(Path::new("/s/teeth-detect/x.png")));
        assert!(store.exists(Path::new("/s/teeth_range.png")));
    }

    #[test]
    fn memory_store_reports_missing_blob() {
        let store = MemoryBlobStore::new();
        let err = store.read(Path::new("/nope.png")).unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[test]
    fn fs_store_round_trips_and_resets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore;
        let file = dir.path().join("teeth").join("tooth_0.png");

        store.write(&file, b"png").expect("write");
        assert_eq!(store.read(&file).expect("read"), b"png");

        store.reset_dir(&dir.path().join("teeth")).expect("reset");
        assert!(!file.exists());
        assert!(dir.path().join("teeth").is_dir());

        let err = store.read(&file).unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[test]
    fn remove_deletes_one_blob_and_tolerates_absence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let range = dir.path().join("teeth_range.png");
        let composite = dir.path().join("teeth_range_detect.png");
        FsBlobStore.write(&range, b"a").expect("write");
        FsBlobStore.write(&composite, b"b").expect("write");

        FsBlobStore.remove(&range).expect("remove");
        FsBlobStore.remove(&range).expect("second remove");
        assert!(!range.exists());
        assert!(composite.exists());

        let memory = MemoryBlobStore::new();
        memory.write(&range, b"a").expect("write");
        memory.remove(&range).expect("remove");
        memory.remove(&composite).expect("absent");
        assert!(memory.is_empty());
    }
}
