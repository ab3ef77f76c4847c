//! WAV streaming: double-buffered refill from storage to a circular I2S sink
//!
//! # Modules
//!
//! - [`wav`] - 44-byte RIFF/WAVE header
//! - [`double_buffer`] - aligned ping-pong buffer with typed halves
//! - [`signal`] - lock-free completion handoff from the sink interrupt
//! - [`engine`] - the streaming engine and its control surface
//! - [`control`] - pure playback state machine
//!
//! # Example
//!
//! ```
//! use platform::mocks::{MockSink, MockStorage};
//! use playback::{DoubleBuffer, StreamSignal, StreamingEngine, WavHeader};
//!
//! let mut file = WavHeader::pcm(8_000, 1, 8, 16).to_bytes().to_vec();
//! file.extend_from_slice(&[0x80; 16]);
//!
//! let signal = StreamSignal::new();
//! let mut buffer = DoubleBuffer::<8>::new();
//! let storage = MockStorage::new().with_file("/tone.wav", file);
//! let mut engine = StreamingEngine::new(&signal, &mut buffer, storage, MockSink::new());
//!
//! engine.play_file("/tone.wav").unwrap();
//! assert_eq!(engine.total_duration(), 0.002);
//! signal.on_half_complete();
//! engine.poll();
//! assert!(engine.is_playing());
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

pub mod control;
pub mod double_buffer;
pub mod engine;
pub mod error;
pub mod signal;
pub mod wav;

pub use control::{ControlEvent, PlaybackState, TransitionError};
pub use double_buffer::{DoubleBuffer, Half};
pub use engine::{PollOutcome, StreamState, StreamingEngine};
pub use error::{PlaybackError, StreamError};
pub use signal::{Notification, StreamSignal};
pub use wav::{HeaderError, WavHeader, HEADER_LEN};
