//! Hardware Abstraction Layer (HAL) for the SD-card WAV player
//!
//! This crate provides trait-based abstractions for the two collaborators the
//! streaming engine talks to, enabling development and testing without
//! physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: scheduler + tasks)
//!         ↓
//! Feature Layer (playback: streaming engine, control state machine)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (filesystem driver, I2S/SAI DMA + codec driver)
//! ```
//!
//! # Abstractions
//!
//! - [`Storage`] / [`File`] - byte-stream source on the removable volume
//! - [`AudioSink`] / [`Restream`] - circular DMA transmit to the codec
//! - [`TransferView`] - non-owning view of the buffer handed to the sink
//! - [`audio_types`] - range-checked audio newtypes
//! - [`config`] - compile-time configuration constants
//!
//! # Features
//!
//! - `std`: Enable standard library support (mocks, `storage_local`)
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```no_run
//! use platform::embedded_io::Read as _;
//! use platform::Storage;
//!
//! fn first_bytes<S: Storage>(storage: &mut S) -> Option<[u8; 4]> {
//!     let mut file = storage.open_file("/music/intro.wav").ok()?;
//!     let mut tag = [0u8; 4];
//!     file.read(&mut tag).ok()?;
//!     Some(tag)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register and peripheral names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio;
pub mod audio_types;
pub mod config;
pub mod dma;
pub mod storage;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

#[cfg(feature = "std")]
pub mod storage_local;

// Re-export main high-level traits
pub use audio::{AudioConfig, AudioSink, Restream, SinkError};
pub use audio_types::{OutOfRangeError, SampleRateHz, VolumePercent};
pub use dma::TransferView;
pub use storage::{File, Storage};

// Re-exported so implementors and callers agree on one embedded-io version.
pub use embedded_io;
