//! Mock implementations for testing
//!
//! In-memory [`Storage`] and a recording [`AudioSink`] for unit and
//! integration tests. Both can share an [`EventLog`] so a test can assert the
//! order in which the sink was stopped and files were closed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use crate::audio::{AudioConfig, AudioSink, Restream, SinkError};
use crate::audio_types::VolumePercent;
use crate::dma::TransferView;
use crate::storage::{File, Storage};

/// Ordered record of side effects shared between mocks.
pub type EventLog = Rc<RefCell<Vec<&'static str>>>;

/// Create an empty [`EventLog`].
#[must_use]
pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(log: Option<&EventLog>, event: &'static str) {
    if let Some(log) = log {
        log.borrow_mut().push(event);
    }
}

// ── Storage ──────────────────────────────────────────────────────────────────

/// Error reported by [`MockStorage`] and [`MockFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStorageError {
    /// No file registered under the requested path.
    NotFound,
    /// The volume was marked unmounted.
    NotMounted,
    /// Injected read failure.
    ReadFailed,
}

impl embedded_io::Error for MockStorageError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NotFound => embedded_io::ErrorKind::NotFound,
            Self::NotMounted | Self::ReadFailed => embedded_io::ErrorKind::Other,
        }
    }
}

#[derive(Clone)]
struct MockEntry {
    path: String,
    data: Vec<u8>,
    reported_size: Option<u64>,
}

/// In-memory volume.
pub struct MockStorage {
    files: Vec<MockEntry>,
    mounted: bool,
    chunk_limit: Option<usize>,
    fail_after: Option<usize>,
    opens: usize,
    closes: Rc<Cell<usize>>,
    log: Option<EventLog>,
}

impl MockStorage {
    /// Create a mounted, empty volume.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            mounted: true,
            chunk_limit: None,
            fail_after: None,
            opens: 0,
            closes: Rc::new(Cell::new(0)),
            log: None,
        }
    }

    /// Builder form of [`add_file`](Self::add_file).
    #[must_use]
    pub fn with_file(mut self, path: &str, data: Vec<u8>) -> Self {
        self.add_file(path, data);
        self
    }

    /// Record file opens and closes in `log`.
    #[must_use]
    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Register (or replace) a file.
    pub fn add_file(&mut self, path: &str, data: Vec<u8>) {
        self.files.retain(|entry| entry.path != path);
        self.files.push(MockEntry {
            path: String::from(path),
            data,
            reported_size: None,
        });
    }

    /// Make `path` report `size` from [`File::size`] regardless of its contents.
    pub fn set_reported_size(&mut self, path: &str, size: u64) {
        if let Some(entry) = self.files.iter_mut().find(|entry| entry.path == path) {
            entry.reported_size = Some(size);
        }
    }

    /// Mark the volume mounted or unmounted. Opens fail while unmounted.
    pub fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    /// Cap every read on files opened afterwards to `limit` bytes.
    pub fn set_chunk_limit(&mut self, limit: Option<usize>) {
        self.chunk_limit = limit;
    }

    /// Files opened afterwards fail once `offset` bytes have been read.
    pub fn set_fail_reads_after(&mut self, offset: Option<usize>) {
        self.fail_after = offset;
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> usize {
        self.opens
    }

    /// Number of files dropped so far.
    pub fn close_count(&self) -> usize {
        self.closes.get()
    }

    /// Files currently open.
    pub fn open_files(&self) -> usize {
        self.opens.saturating_sub(self.closes.get())
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MockStorage {
    type Error = MockStorageError;
    type File = MockFile;

    fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        if !self.mounted {
            return Err(MockStorageError::NotMounted);
        }
        let entry = self
            .files
            .iter()
            .find(|entry| entry.path == path)
            .cloned()
            .ok_or(MockStorageError::NotFound)?;
        self.opens = self.opens.saturating_add(1);
        record(self.log.as_ref(), "file.open");
        let size = entry
            .reported_size
            .unwrap_or(u64::try_from(entry.data.len()).unwrap_or(u64::MAX));
        Ok(MockFile {
            data: entry.data,
            pos: 0,
            size,
            chunk_limit: self.chunk_limit,
            fail_after: self.fail_after,
            closes: Rc::clone(&self.closes),
            log: self.log.clone(),
        })
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }
}

/// Open handle onto a [`MockStorage`] file.
pub struct MockFile {
    data: Vec<u8>,
    pos: usize,
    size: u64,
    chunk_limit: Option<usize>,
    fail_after: Option<usize>,
    closes: Rc<Cell<usize>>,
    log: Option<EventLog>,
}

impl MockFile {
    /// Bytes handed out so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl embedded_io::ErrorType for MockFile {
    type Error = MockStorageError;
}

impl embedded_io::Read for MockFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut budget = buf.len();
        if let Some(fail_at) = self.fail_after {
            if self.pos >= fail_at {
                return Err(MockStorageError::ReadFailed);
            }
            budget = budget.min(fail_at.saturating_sub(self.pos));
        }
        if let Some(limit) = self.chunk_limit {
            budget = budget.min(limit);
        }
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let n = budget.min(rest.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), rest.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.pos = self.pos.saturating_add(n);
        Ok(n)
    }
}

impl File for MockFile {
    fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for MockFile {
    fn drop(&mut self) {
        self.closes.set(self.closes.get().saturating_add(1));
        record(self.log.as_ref(), "file.close");
    }
}

// ── Audio sink ───────────────────────────────────────────────────────────────

/// Recording audio sink.
#[derive(Default)]
pub struct MockSink {
    configured: Option<AudioConfig>,
    active: bool,
    paused: bool,
    busy: bool,
    fail_configure: bool,
    volume: Option<VolumePercent>,
    start_count: usize,
    stop_count: usize,
    restream_count: usize,
    last_view: Option<TransferView>,
    log: Option<EventLog>,
}

impl MockSink {
    /// Create an idle sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record starts and stops in `log`.
    #[must_use]
    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Reject every `start` with [`SinkError::Busy`] while set.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Reject every `configure` with [`SinkError::Unsupported`] while set.
    pub fn set_fail_configure(&mut self, fail: bool) {
        self.fail_configure = fail;
    }

    /// Last configuration applied.
    pub fn configured(&self) -> Option<AudioConfig> {
        self.configured
    }

    /// `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last volume set, if any.
    pub fn volume(&self) -> Option<VolumePercent> {
        self.volume
    }

    /// Successful starts.
    pub fn start_count(&self) -> usize {
        self.start_count
    }

    /// Calls to `stop` while active.
    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    /// Calls to `restream`.
    pub fn restream_count(&self) -> usize {
        self.restream_count
    }

    /// View passed to the most recent successful start.
    pub fn last_view(&self) -> Option<TransferView> {
        self.last_view
    }
}

impl AudioSink for MockSink {
    fn configure(&mut self, config: AudioConfig) -> Result<(), SinkError> {
        if self.fail_configure {
            return Err(SinkError::Unsupported);
        }
        self.configured = Some(config);
        Ok(())
    }

    fn start(&mut self, view: TransferView) -> Result<(), SinkError> {
        if self.busy || self.active {
            return Err(SinkError::Busy);
        }
        self.active = true;
        self.paused = false;
        self.start_count = self.start_count.saturating_add(1);
        self.last_view = Some(view);
        record(self.log.as_ref(), "sink.start");
        Ok(())
    }

    fn stop(&mut self) {
        if self.active {
            self.stop_count = self.stop_count.saturating_add(1);
            record(self.log.as_ref(), "sink.stop");
        }
        self.active = false;
        self.paused = false;
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.paused = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        self.paused = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), SinkError> {
        self.volume = Some(volume);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Restream for MockSink {
    fn restream(&mut self) {
        self.restream_count = self.restream_count.saturating_add(1);
    }
}
