//! Double-buffered WAV streaming engine.
//!
//! [`StreamingEngine`] keeps a circular sink transfer fed from a slow
//! byte-stream source. It runs entirely in the polled context: the sink's
//! completion interrupt only touches the [`StreamSignal`], and every storage
//! read happens in [`StreamingEngine::poll`].
//!
//! ```text
//!   start_stream ──► fill both halves ──► sink.start(view)
//!                                            │
//!   IRQ: on_half_complete / on_full_complete │  (store only)
//!                                            ▼
//!   poll ──► snapshot signal ──► refill the half that just played
//! ```
//!
//! Timing is derived from bytes consumed out of the source, so
//! [`current_position`](StreamingEngine::current_position) runs up to one
//! buffer ahead of what is audible.

use heapless::String;
use platform::config::MAX_PATH_LEN;
use platform::embedded_io::Read;
use platform::{AudioSink, File, Storage, VolumePercent};

use crate::control::{ControlEvent, PlaybackState};
use crate::double_buffer::{DoubleBuffer, Half};
use crate::error::{PlaybackError, StreamError};
use crate::signal::StreamSignal;
use crate::wav::{WavHeader, HEADER_LEN};

/// Refill status as seen from the polled context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    /// No session.
    Idle,
    /// The sink finished a half that has not been refilled yet.
    RefillPending(Half),
    /// A refill read is in progress.
    Refilling,
    /// Both halves hold fresh data; nothing to do until the next completion.
    Handled,
}

/// What one call to [`StreamingEngine::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No session.
    Idle,
    /// Paused; completions are serviced after resume.
    Paused,
    /// No completion since the last refill.
    Nothing,
    /// `half` was refilled with `bytes` bytes of audio, the rest silence.
    Refilled {
        /// Half that was written.
        half: Half,
        /// Audio bytes read into it.
        bytes: usize,
    },
    /// More than one completion arrived since the last poll, or one arrived
    /// while the refill was being read. Only the latest half was refilled.
    Overrun {
        /// Completions that arrived before their half was refilled.
        missed: u32,
        /// Half that was written.
        half: Half,
        /// Audio bytes read into it.
        bytes: usize,
    },
    /// The source was exhausted and its last audio has played; the session
    /// has been stopped.
    EndOfStream,
}

/// Byte accounting behind the time queries. Survives the session so position
/// and duration stay readable after a stop.
#[derive(Debug, Clone, Copy, Default)]
struct Timing {
    total: u32,
    remaining: u32,
    byte_rate: u32,
}

impl Timing {
    #[allow(clippy::cast_precision_loss)] // seconds for display; exact below 2^24 bytes
    fn seconds(&self, bytes: u32) -> f32 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        bytes as f32 / self.byte_rate as f32
    }
}

struct PlaybackSession<F> {
    path: String<MAX_PATH_LEN>,
    file: F,
    header: WavHeader,
}

/// Streams one WAV file at a time from `St` to `S` through a `N`-byte
/// double buffer.
///
/// The engine borrows the buffer for `'a`, so the memory handed to the sink
/// outlives every transfer. The signal is shared with the sink's interrupt
/// handler. Dropping the engine stops the sink.
pub struct StreamingEngine<'a, St: Storage, S: AudioSink, const N: usize> {
    signal: &'a StreamSignal,
    buffer: &'a mut DoubleBuffer<N>,
    storage: St,
    sink: S,
    session: Option<PlaybackSession<St::File>>,
    state: PlaybackState,
    phase: StreamState,
    serviced: u32,
    timing: Timing,
    overruns: u32,
}

impl<'a, St: Storage, S: AudioSink, const N: usize> StreamingEngine<'a, St, S, N> {
    /// Create an idle engine.
    pub fn new(
        signal: &'a StreamSignal,
        buffer: &'a mut DoubleBuffer<N>,
        storage: St,
        sink: S,
    ) -> Self {
        Self {
            serviced: signal.snapshot().sequence,
            signal,
            buffer,
            storage,
            sink,
            session: None,
            state: PlaybackState::Idle,
            phase: StreamState::Idle,
            timing: Timing::default(),
            overruns: 0,
        }
    }

    /// Open `path`, prime the whole buffer and start the sink.
    ///
    /// On any error the source is closed and the engine stays as it was; in
    /// particular an active session is not disturbed by
    /// [`StreamError::AlreadyActive`].
    pub fn start_stream(&mut self, path: &str) -> Result<(), StreamError> {
        let next = self
            .state
            .transition(ControlEvent::Started)
            .map_err(|_| StreamError::AlreadyActive)?;

        let mut stored = String::new();
        stored.push_str(path).map_err(|_| StreamError::PathTooLong)?;

        let mut file = self.storage.open_file(path).map_err(|_| {
            warn!("cannot open {}", path);
            StreamError::Open
        })?;

        let mut raw = [0u8; HEADER_LEN];
        let (read, result) = read_up_to(&mut file, &mut raw);
        if result.is_err() {
            return Err(StreamError::Read);
        }
        if read < HEADER_LEN {
            warn!("{}: header truncated at {} bytes", path, read);
            return Err(StreamError::ShortHeader { read });
        }
        let header = WavHeader::parse(&raw);
        header.validate()?;
        if let Some(tag) = header.mismatched_tag() {
            warn!(
                "{}: unexpected chunk tag {}",
                path,
                core::str::from_utf8(&tag).unwrap_or("????")
            );
        }
        if u64::from(header.file_size) > file.size() {
            warn!(
                "{}: header declares {} bytes, file has {}",
                path,
                header.file_size,
                file.size()
            );
        }

        let config = header.audio_config();
        if config.validate().is_err() {
            warn!("{}: unsupported format {} Hz", path, config.sample_rate);
            return Err(StreamError::Sink(platform::SinkError::Unsupported));
        }

        let total = header.payload_len();
        let mut failed = false;
        let primed = self.buffer.fill_whole(to_usize(total), |dst| {
            let (n, result) = read_up_to(&mut file, dst);
            failed = result.is_err();
            n
        });
        let remaining = if failed {
            0
        } else {
            total.saturating_sub(to_u32(primed))
        };

        self.sink.configure(config)?;
        // Completions published before this point belong to an earlier stream.
        let baseline = self.signal.snapshot().sequence;
        self.sink.start(self.buffer.transfer_view())?;

        info!(
            "playing {}: {} Hz, {} ch, {} bit, {} bytes",
            path,
            header.sample_rate,
            header.channels,
            header.bits_per_sample,
            total
        );

        self.serviced = baseline;
        self.timing = Timing {
            total,
            remaining,
            byte_rate: header.byte_rate,
        };
        self.session = Some(PlaybackSession {
            path: stored,
            file,
            header,
        });
        self.state = next;
        self.phase = StreamState::Handled;
        Ok(())
    }

    /// Control-surface name for [`start_stream`](Self::start_stream).
    pub fn play_file(&mut self, path: &str) -> Result<(), StreamError> {
        self.start_stream(path)
    }

    /// Service the latest completion, if any. Bounded to one half-buffer read.
    pub fn poll(&mut self) -> PollOutcome {
        match self.state {
            PlaybackState::Idle => return PollOutcome::Idle,
            PlaybackState::Paused => return PollOutcome::Paused,
            PlaybackState::Playing => {}
        }

        let note = self.signal.snapshot();
        let pending = note.pending_since(self.serviced);
        if pending == 0 {
            return PollOutcome::Nothing;
        }
        self.serviced = note.sequence;

        let missed = pending.saturating_sub(1);
        if missed > 0 {
            self.overruns = self.overruns.saturating_add(1);
            error!("refill overrun: {} completion(s) missed", missed);
        }

        if self.timing.remaining == 0 {
            self.finish(ControlEvent::EndOfData);
            info!("end of stream");
            return PollOutcome::EndOfStream;
        }

        let Some(session) = self.session.as_mut() else {
            return PollOutcome::Idle;
        };
        self.phase = StreamState::Refilling;

        let want = to_usize(self.timing.remaining).min(DoubleBuffer::<N>::HALF);
        let mut failed = false;
        let bytes = self.buffer.fill_half(note.half, want, |dst| {
            let (n, result) = read_up_to(&mut session.file, dst);
            failed = result.is_err();
            n
        });
        if failed {
            warn!("{}: read failed, finishing stream", session.path.as_str());
        }
        self.timing.remaining = if failed || bytes < want {
            0
        } else {
            self.timing.remaining.saturating_sub(to_u32(bytes))
        };
        self.phase = StreamState::Handled;

        // A completion during the read means the sink moved into the half
        // that was being written.
        let late = self.signal.snapshot().pending_since(note.sequence);
        if late > 0 {
            if missed == 0 {
                self.overruns = self.overruns.saturating_add(1);
            }
            error!("refill overrun: {} completion(s) during refill", late);
        }
        let missed = missed.saturating_add(late);

        if missed > 0 {
            PollOutcome::Overrun {
                missed,
                half: note.half,
                bytes,
            }
        } else {
            PollOutcome::Refilled {
                half: note.half,
                bytes,
            }
        }
    }

    /// Suspend sink output. Idempotent while paused.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        let next = self.state.transition(ControlEvent::Pause)?;
        if self.state == PlaybackState::Playing {
            self.sink.pause()?;
            debug!("paused");
        }
        self.state = next;
        Ok(())
    }

    /// Continue sink output. Idempotent while playing.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        let next = self.state.transition(ControlEvent::Resume)?;
        if self.state == PlaybackState::Paused {
            self.sink.resume()?;
            debug!("resumed");
        }
        self.state = next;
        Ok(())
    }

    /// End the session. Returns `false` if there was none.
    pub fn stop(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        self.finish(ControlEvent::Stop);
        info!("stopped");
        true
    }

    /// Forward a master volume change to the sink.
    pub fn set_volume(&mut self, volume: VolumePercent) -> Result<(), PlaybackError> {
        self.sink.set_volume(volume)?;
        Ok(())
    }

    fn finish(&mut self, event: ControlEvent) {
        // The sink must be quiet before the file goes away.
        self.sink.stop();
        self.session = None;
        self.state = self.state.transition(event).unwrap_or(PlaybackState::Idle);
        self.phase = StreamState::Idle;
    }

    /// Seconds of audio consumed from the source in the current or last
    /// session.
    pub fn current_position(&self) -> f32 {
        self.timing
            .seconds(self.timing.total.saturating_sub(self.timing.remaining))
    }

    /// Length of the current or last stream in seconds.
    pub fn total_duration(&self) -> f32 {
        self.timing.seconds(self.timing.total)
    }

    /// `true` while a session exists, paused or not.
    pub fn is_playing(&self) -> bool {
        self.state.is_active()
    }

    /// `true` while paused.
    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// Control state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Refill state.
    pub fn stream_state(&self) -> StreamState {
        if self.session.is_none() {
            return StreamState::Idle;
        }
        let note = self.signal.snapshot();
        if note.pending_since(self.serviced) > 0 {
            StreamState::RefillPending(note.half)
        } else {
            self.phase
        }
    }

    /// Polls that found a completion their refill could not keep up with.
    pub fn overrun_count(&self) -> u32 {
        self.overruns
    }

    /// Header of the active stream.
    pub fn header(&self) -> Option<&WavHeader> {
        self.session.as_ref().map(|s| &s.header)
    }

    /// Path of the active stream.
    pub fn path(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.path.as_str())
    }

    /// Audio bytes not yet read from the source.
    pub fn bytes_remaining(&self) -> u32 {
        self.timing.remaining
    }

    /// The double buffer, for inspection.
    pub fn buffer(&self) -> &DoubleBuffer<N> {
        self.buffer
    }

    /// Completion signal shared with the sink interrupt.
    pub fn signal(&self) -> &'a StreamSignal {
        self.signal
    }

    /// Audio sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Audio sink, mutably. Used by the notification glue to re-arm the
    /// transfer.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Byte-stream source.
    pub fn storage(&self) -> &St {
        &self.storage
    }
}

impl<St: Storage, S: AudioSink, const N: usize> Drop for StreamingEngine<'_, St, S, N> {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.sink.stop();
        }
    }
}

/// Read until `dst` is full, the source reports end of file, or a read fails.
///
/// Returns the bytes obtained together with the error, if one ended the loop.
fn read_up_to<R: Read>(source: &mut R, dst: &mut [u8]) -> (usize, Result<(), R::Error>) {
    let mut filled = 0usize;
    while let Some(rest) = dst.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match source.read(rest) {
            Ok(0) => break,
            Ok(n) => filled = filled.saturating_add(n.min(rest.len())),
            Err(err) => return (filled, Err(err)),
        }
    }
    (filled, Ok(()))
}

fn to_usize(n: u32) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
