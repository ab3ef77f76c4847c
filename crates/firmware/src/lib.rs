//! SD WAV player firmware core
//!
//! Wires the streaming engine into a cooperative task scheduler.
//!
//! ```text
//! host_player / board entry point
//!         ↓
//! scheduler::App   (init → self test → run loop)
//!         ↓
//! tasks            (PlaybackTask, HeartbeatTask)
//!         ↓
//! playback engine  →  platform traits (Storage, AudioSink)
//! ```
//!
//! # Features
//!
//! - `emulator` - desktop player: local files, simulated sink, tracing output
//! - `std` - enable the standard library (host storage, mocks)
//! - `defmt` / `tracing` - logging backend
//!
//! ```bash
//! MUSIC_PATH=./music cargo run -p firmware --bin host_player --features emulator -- /tone.wav
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)]
#![warn(clippy::dbg_macro)]

#[macro_use]
mod fmt;

pub mod scheduler;
pub mod tasks;

#[cfg(feature = "emulator")]
pub mod emulator;

pub use scheduler::{App, Precondition, SchedulerError, SelfTestReport, Task};
pub use tasks::{CommandQueue, HeartbeatTask, PlaybackTask, PlayerCommand};
