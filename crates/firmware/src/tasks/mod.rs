//! Scheduler tasks.

mod heartbeat;
mod playback;

pub use heartbeat::HeartbeatTask;
pub use playback::{CommandQueue, PlaybackTask, PlayerCommand};
