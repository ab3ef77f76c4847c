//! Local filesystem Storage implementation for the desktop emulator.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled (emulator builds only).
//! All paths are resolved relative to the music root provided at construction;
//! a leading `/` on a path is treated as the root of that directory, matching
//! how paths are written for the SD card.

use std::fs;
use std::io::Read as _;
use std::path::PathBuf;

use crate::storage::{File, Storage};

/// Error type for local filesystem operations.
#[derive(Debug, thiserror::Error)]
#[error("local storage error: {0}")]
pub struct LocalStorageError(#[from] pub std::io::Error);

impl embedded_io::Error for LocalStorageError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
    size: u64,
}

impl embedded_io::ErrorType for LocalFile {
    type Error = LocalStorageError;
}

impl embedded_io::Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.inner.read(buf).map_err(LocalStorageError)
    }
}

impl File for LocalFile {
    fn size(&self) -> u64 {
        self.size
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// # Example
/// ```no_run
/// use platform::storage_local::LocalFileStorage;
/// use platform::Storage;
/// let mut storage = LocalFileStorage::new("/home/user/music");
/// let file = storage.open_file("/track01.wav");
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `music_root`.
    #[must_use]
    pub fn new(music_root: &str) -> Self {
        Self {
            root: PathBuf::from(music_root),
        }
    }

    /// Create from the `MUSIC_PATH` environment variable.
    ///
    /// Returns `None` if `MUSIC_PATH` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("MUSIC_PATH").ok().map(|p| Self::new(&p))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for LocalFileStorage {
    type Error = LocalStorageError;
    type File = LocalFile;

    fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let file = fs::File::open(self.resolve(path))?;
        let size = file.metadata()?.len();
        Ok(LocalFile { inner: file, size })
    }

    fn is_mounted(&self) -> bool {
        self.root.is_dir()
    }
}
