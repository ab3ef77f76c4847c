//! Application configuration and constants
//!
//! Sizing and timing values shared by the engine, the scheduler and the
//! emulator. Reference these rather than hardcoding numbers.

/// The application name
pub const APP_NAME: &str = "SD WAV Player";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the audio double buffer in bytes (both halves together).
///
/// 4096 bytes per half is 1024 stereo 16-bit frames, about 23 ms at 44.1 kHz.
/// The refill deadline is one half's playback time.
pub const AUDIO_BUFFER_BYTES: usize = 8192;

/// Longest file path a session will retain, in bytes.
pub const MAX_PATH_LEN: usize = 64;

/// Maximum number of tasks the scheduler registry holds.
pub const MAX_TASKS: usize = 8;

/// Heartbeat LED toggle period.
pub const HEARTBEAT_PERIOD_MS: u64 = 500;

/// Depth of the player command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

/// Percentage points moved by one volume up/down command.
pub const VOLUME_STEP: u8 = 5;

const _: () = assert!(AUDIO_BUFFER_BYTES % 4 == 0 && AUDIO_BUFFER_BYTES > 0);
