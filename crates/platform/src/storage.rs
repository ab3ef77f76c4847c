//! Storage abstraction for the removable volume
//!
//! The streaming engine consumes files as plain byte streams. Reads go through
//! [`embedded_io::Read`], whose contract already matches the source contract
//! the engine relies on: a read may return fewer bytes than requested, `0`
//! means end of file, and it never blocks indefinitely.
//!
//! Closing a file is dropping it.

/// Storage trait for file system access
pub trait Storage {
    /// Error type
    type Error: core::fmt::Debug;
    /// File type
    type File: File;

    /// Open file for reading.
    ///
    /// A missing or unreadable file is reported as `Err`; the engine maps any
    /// error here to its open failure.
    fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error>;

    /// `true` when the volume is mounted and files can be opened.
    ///
    /// Checked once by the power-on self test.
    fn is_mounted(&self) -> bool;
}

/// File trait for reading files sequentially
pub trait File: embedded_io::Read {
    /// Get file size in bytes, as reported by the filesystem.
    fn size(&self) -> u64;
}
