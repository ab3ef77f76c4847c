//! End-to-end behaviour of the streaming engine against the platform mocks.
//!
//! Geometry used throughout: a 4000-byte buffer (2000-byte halves) and
//! 8-bit mono at 8 kHz, so one byte is 1/8000 s.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::float_cmp
)]

use platform::mocks::{event_log, MockSink, MockStorage};
use platform::{AudioSink, SinkError, VolumePercent};
use playback::{
    DoubleBuffer, Half, HeaderError, PlaybackError, PlaybackState, PollOutcome, StreamError,
    StreamSignal, StreamState, StreamingEngine, WavHeader,
};

const N: usize = 4000;
const HALF: usize = N / 2;

type Engine<'a> = StreamingEngine<'a, MockStorage, MockSink, N>;

fn pcm8(data_len: usize) -> Vec<u8> {
    let mut bytes = WavHeader::pcm(8_000, 1, 8, u32::try_from(data_len).unwrap())
        .to_bytes()
        .to_vec();
    bytes.extend((0..data_len).map(|i| (i % 251) as u8 | 1));
    bytes
}

fn storage_with(path: &str, data_len: usize) -> MockStorage {
    MockStorage::new().with_file(path, pcm8(data_len))
}

/// Deliver the next completion in strict alternation and service it.
fn step(engine: &mut Engine<'_>, next: &mut Half) -> PollOutcome {
    let signal = engine.signal();
    match next {
        Half::First => signal.on_half_complete(),
        Half::Second => signal.on_full_complete(engine.sink_mut()),
    }
    *next = next.other();
    engine.poll()
}

#[test]
fn sixteen_thousand_bytes_at_8k_is_two_seconds() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 16_000), MockSink::new());

    engine.play_file("/a.wav").unwrap();
    assert_eq!(engine.total_duration(), 2.0);
    assert_eq!(engine.current_position(), 0.5);

    let mut next = Half::First;
    step(&mut engine, &mut next);
    step(&mut engine, &mut next);
    // 8000 bytes consumed from the source
    assert_eq!(engine.bytes_remaining(), 8_000);
    assert_eq!(engine.current_position(), 1.0);
    assert_eq!(engine.total_duration(), 2.0);
}

#[test]
fn start_configures_sink_from_header() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 100), MockSink::new());

    engine.start_stream("/a.wav").unwrap();
    let config = engine.sink().configured().unwrap();
    assert_eq!(config.sample_rate, 8_000);
    assert_eq!(config.channels, 1);
    assert_eq!(config.bit_depth, 8);
    assert!(engine.sink().is_active());
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert_eq!(engine.header().unwrap().byte_rate, 8_000);
}

#[test]
fn start_while_active_leaves_session_untouched() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut storage = storage_with("/a.wav", 16_000);
    storage.add_file("/b.wav", pcm8(100));
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());

    engine.start_stream("/a.wav").unwrap();
    let remaining = engine.bytes_remaining();

    assert_eq!(engine.start_stream("/b.wav"), Err(StreamError::AlreadyActive));
    assert_eq!(engine.path(), Some("/a.wav"));
    assert_eq!(engine.bytes_remaining(), remaining);
    assert_eq!(engine.storage().open_count(), 1);
    assert_eq!(engine.sink().start_count(), 1);
    assert!(engine.is_playing());
}

#[test]
fn stop_is_idempotent() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 16_000), MockSink::new());

    assert!(!engine.stop());
    engine.start_stream("/a.wav").unwrap();
    assert!(engine.stop());
    assert!(!engine.stop());
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert_eq!(engine.stream_state(), StreamState::Idle);
    assert_eq!(engine.sink().stop_count(), 1);
    assert_eq!(engine.storage().open_files(), 0);
}

#[test]
fn stop_halts_sink_before_closing_file() {
    let log = event_log();
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let storage = storage_with("/a.wav", 16_000).with_event_log(log.clone());
    let sink = MockSink::new().with_event_log(log.clone());
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, sink);

    engine.start_stream("/a.wav").unwrap();
    engine.stop();
    assert_eq!(
        *log.borrow(),
        vec!["file.open", "sink.start", "sink.stop", "file.close"]
    );
}

#[test]
fn missing_file_then_valid_start() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 500), MockSink::new());

    assert_eq!(engine.start_stream("missing.wav"), Err(StreamError::Open));
    assert!(!engine.is_playing());
    assert_eq!(engine.path(), None);
    assert_eq!(engine.sink().start_count(), 0);

    engine.start_stream("/a.wav").unwrap();
    assert!(engine.is_playing());
}

#[test]
fn truncated_header_closes_source() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let storage = MockStorage::new().with_file("/short.wav", b"RIFF\x10\0\0\0WAVEfmt ".to_vec());
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());

    assert_eq!(
        engine.start_stream("/short.wav"),
        Err(StreamError::ShortHeader { read: 16 })
    );
    assert_eq!(engine.storage().open_files(), 0);
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn header_read_through_chunked_source() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut storage = storage_with("/a.wav", 3_000);
    storage.set_chunk_limit(Some(7));
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());

    engine.start_stream("/a.wav").unwrap();
    assert_eq!(engine.bytes_remaining(), 0);
    assert_ne!(engine.buffer().half(Half::Second)[999], 0);
    assert_eq!(engine.buffer().half(Half::Second)[1000], 0);
}

#[test]
fn zero_byte_rate_rejected() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut header = WavHeader::pcm(8_000, 1, 8, 10);
    header.byte_rate = 0;
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&[1; 10]);
    let storage = MockStorage::new().with_file("/z.wav", bytes);
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());

    assert_eq!(
        engine.start_stream("/z.wav"),
        Err(StreamError::InvalidHeader(HeaderError::ZeroByteRate))
    );
    assert_eq!(engine.storage().open_files(), 0);
    assert_eq!(engine.current_position(), 0.0);
    assert_eq!(engine.total_duration(), 0.0);
}

#[test]
fn busy_sink_rejects_start_and_releases_source() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut sink = MockSink::new();
    sink.set_busy(true);
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 500), sink);

    assert_eq!(engine.start_stream("/a.wav"), Err(StreamError::SinkBusy));
    assert_eq!(engine.storage().open_files(), 0);
    assert!(!engine.is_playing());
}

#[test]
fn sink_configure_failure_is_reported() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut sink = MockSink::new();
    sink.set_fail_configure(true);
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 500), sink);

    assert_eq!(
        engine.start_stream("/a.wav"),
        Err(StreamError::Sink(SinkError::Unsupported))
    );
    assert_eq!(engine.storage().open_files(), 0);
}

#[test]
fn overlong_path_rejected_before_open() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, MockStorage::new(), MockSink::new());

    let path = "/".repeat(platform::config::MAX_PATH_LEN + 1);
    assert_eq!(engine.start_stream(&path), Err(StreamError::PathTooLong));
    assert_eq!(engine.storage().open_count(), 0);
}

#[test]
fn final_partial_refill_pads_then_ends_on_next_completion() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 5_000), MockSink::new());

    engine.start_stream("/a.wav").unwrap();
    assert_eq!(engine.bytes_remaining(), 1_000);

    let mut next = Half::First;
    assert_eq!(
        step(&mut engine, &mut next),
        PollOutcome::Refilled {
            half: Half::First,
            bytes: 1_000
        }
    );
    let first = engine.buffer().half(Half::First);
    assert!(first[..1_000].iter().all(|&b| b != 0));
    assert!(first[1_000..].iter().all(|&b| b == 0));
    assert!(engine.is_playing());

    assert_eq!(step(&mut engine, &mut next), PollOutcome::EndOfStream);
    assert!(!engine.is_playing());
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert_eq!(engine.storage().open_files(), 0);
    assert_eq!(engine.sink().stop_count(), 1);

    // No further refill once idle.
    signal.on_half_complete();
    assert_eq!(engine.poll(), PollOutcome::Idle);
    // Position stays readable after the session ended.
    assert_eq!(engine.current_position(), 5_000.0 / 8_000.0);
}

#[test]
fn exact_multiple_streams_every_byte() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 3 * N), MockSink::new());

    engine.start_stream("/a.wav").unwrap();
    let mut next = Half::First;
    let mut refills = 0;
    loop {
        match step(&mut engine, &mut next) {
            PollOutcome::Refilled { bytes, .. } => {
                assert_eq!(bytes, HALF);
                refills += 1;
            }
            PollOutcome::EndOfStream => break,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(refills, 4);
    assert_eq!(engine.current_position(), engine.total_duration());
    assert_eq!(engine.sink().restream_count(), 2);
}

#[test]
fn two_completions_before_poll_is_an_overrun() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 16_000), MockSink::new());
    engine.start_stream("/a.wav").unwrap();
    let before = engine.bytes_remaining();

    signal.on_half_complete();
    signal.on_full_complete(engine.sink_mut());
    assert_eq!(
        engine.poll(),
        PollOutcome::Overrun {
            missed: 1,
            half: Half::Second,
            bytes: HALF
        }
    );
    assert_eq!(engine.overrun_count(), 1);
    assert_eq!(engine.bytes_remaining(), before - HALF as u32);
    assert_eq!(engine.poll(), PollOutcome::Nothing);
    assert_eq!(engine.stream_state(), StreamState::Handled);

    // Alternation resumes normally afterwards.
    signal.on_half_complete();
    assert_eq!(
        engine.poll(),
        PollOutcome::Refilled {
            half: Half::First,
            bytes: HALF
        }
    );
    assert_eq!(engine.overrun_count(), 1);
}

#[test]
fn read_error_mid_stream_finishes_with_silence() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut storage = storage_with("/a.wav", 16_000);
    // Header plus the priming fill succeed, the second refill fails part way.
    storage.set_fail_reads_after(Some(44 + N + HALF + 10));
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());
    engine.start_stream("/a.wav").unwrap();

    let mut next = Half::First;
    assert_eq!(
        step(&mut engine, &mut next),
        PollOutcome::Refilled {
            half: Half::First,
            bytes: HALF
        }
    );
    assert_eq!(
        step(&mut engine, &mut next),
        PollOutcome::Refilled {
            half: Half::Second,
            bytes: 10
        }
    );
    assert_eq!(engine.bytes_remaining(), 0);
    assert!(engine.buffer().half(Half::Second)[10..].iter().all(|&b| b == 0));
    assert_eq!(step(&mut engine, &mut next), PollOutcome::EndOfStream);
}

#[test]
fn pause_freezes_position_and_defers_refill() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 16_000), MockSink::new());
    engine.start_stream("/a.wav").unwrap();

    signal.on_half_complete();
    engine.pause().unwrap();
    engine.pause().unwrap();
    assert!(engine.is_paused());
    assert!(engine.is_playing());
    assert!(engine.sink().is_paused());

    let frozen = engine.current_position();
    assert_eq!(engine.poll(), PollOutcome::Paused);
    assert_eq!(engine.current_position(), frozen);

    engine.resume().unwrap();
    engine.resume().unwrap();
    assert!(!engine.is_paused());
    assert!(!engine.sink().is_paused());
    assert_eq!(
        engine.poll(),
        PollOutcome::Refilled {
            half: Half::First,
            bytes: HALF
        }
    );
    assert!(engine.current_position() > frozen);
}

#[test]
fn pause_and_resume_need_a_session() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, MockStorage::new(), MockSink::new());

    assert_eq!(engine.pause(), Err(PlaybackError::NOT_ACTIVE));
    assert_eq!(engine.resume(), Err(PlaybackError::NOT_ACTIVE));
}

#[test]
fn stop_while_paused_returns_idle() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, storage_with("/a.wav", 16_000), MockSink::new());
    engine.start_stream("/a.wav").unwrap();
    engine.pause().unwrap();

    assert!(engine.stop());
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(!engine.is_playing());
    assert!(!engine.is_paused());

    // The session can start again after a stop from Paused.
    engine.start_stream("/a.wav").unwrap();
    assert_eq!(engine.state(), PlaybackState::Playing);
}

#[test]
fn position_resets_only_on_new_start() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut storage = storage_with("/a.wav", 16_000);
    storage.add_file("/b.wav", pcm8(40_000));
    let mut engine: Engine<'_> = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());

    engine.start_stream("/a.wav").unwrap();
    let mut next = Half::First;
    step(&mut engine, &mut next);
    engine.stop();
    assert_eq!(engine.current_position(), 0.75);

    // A failed start does not reset anything.
    assert!(engine.start_stream("/nope.wav").is_err());
    assert_eq!(engine.current_position(), 0.75);

    engine.start_stream("/b.wav").unwrap();
    assert_eq!(engine.current_position(), 0.5);
    assert_eq!(engine.total_duration(), 5.0);
}

#[test]
fn volume_is_forwarded() {
    let signal = StreamSignal::new();
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine: Engine<'_> =
        StreamingEngine::new(&signal, &mut buffer, MockStorage::new(), MockSink::new());

    engine.set_volume(VolumePercent::new(40)).unwrap();
    assert_eq!(engine.sink().volume(), Some(VolumePercent::new(40)));
}

/// Source that lets the sink finish the other half in the middle of the
/// first refill read, as a slow card would.
struct SlowCard {
    data: Vec<u8>,
    pos: usize,
    complete_at: usize,
    signal: &'static StreamSignal,
}

struct Rewind;

impl platform::Restream for Rewind {
    fn restream(&mut self) {}
}

impl platform::embedded_io::ErrorType for SlowCard {
    type Error = platform::embedded_io::ErrorKind;
}

impl platform::embedded_io::Read for SlowCard {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.pos == self.complete_at {
            self.signal.on_full_complete(&mut Rewind);
        }
        let rest = &self.data[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl platform::File for SlowCard {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

struct SlowCardStorage(Option<SlowCard>);

impl platform::Storage for SlowCardStorage {
    type Error = ();
    type File = SlowCard;

    fn open_file(&mut self, _path: &str) -> Result<SlowCard, ()> {
        self.0.take().ok_or(())
    }

    fn is_mounted(&self) -> bool {
        true
    }
}

#[test]
fn completion_during_refill_read_is_an_overrun() {
    static SIGNAL: StreamSignal = StreamSignal::new();
    let card = SlowCard {
        data: pcm8(16_000),
        pos: 0,
        // First byte after the header and the primed buffer.
        complete_at: 44 + N,
        signal: &SIGNAL,
    };
    let mut buffer = DoubleBuffer::<N>::new();
    let mut engine =
        StreamingEngine::new(&SIGNAL, &mut buffer, SlowCardStorage(Some(card)), MockSink::new());
    engine.start_stream("/slow.wav").unwrap();

    SIGNAL.on_half_complete();
    assert_eq!(
        engine.poll(),
        PollOutcome::Overrun {
            missed: 1,
            half: Half::First,
            bytes: HALF
        }
    );
    assert_eq!(engine.overrun_count(), 1);

    // The late completion is still serviced on the next pass.
    assert_eq!(
        engine.poll(),
        PollOutcome::Refilled {
            half: Half::Second,
            bytes: HALF
        }
    );
    assert_eq!(engine.overrun_count(), 1);
    assert_eq!(engine.poll(), PollOutcome::Nothing);
}
