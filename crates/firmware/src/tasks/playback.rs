//! Playback task: drives the streaming engine from the run loop.
//!
//! Control requests arrive on a [`CommandQueue`]. Whatever feeds it (a serial
//! menu, buttons, the host binary) never touches the engine directly; the
//! task drains the queue without blocking and then services the buffer.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use platform::config::{COMMAND_QUEUE_DEPTH, MAX_PATH_LEN, VOLUME_STEP};
use platform::{AudioSink, Storage, VolumePercent};
use playback::{PlaybackState, PollOutcome, StreamingEngine};

use crate::scheduler::Task;

/// Request for the playback task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Start `path`. Rejected while a session is active; send
    /// [`PlayerCommand::Stop`] first to switch files.
    Play(String<MAX_PATH_LEN>),
    /// Suspend output.
    Pause,
    /// Continue output.
    Resume,
    /// End the session.
    Stop,
    /// Change master volume.
    SetVolume(VolumePercent),
    /// Raise master volume by [`VOLUME_STEP`].
    VolumeUp,
    /// Lower master volume by [`VOLUME_STEP`].
    VolumeDown,
}

impl PlayerCommand {
    /// Build a [`PlayerCommand::Play`], or `None` if `path` does not fit.
    pub fn play(path: &str) -> Option<Self> {
        let mut stored = String::new();
        stored.push_str(path).ok()?;
        Some(Self::Play(stored))
    }
}

/// Single-core command queue shared between a controller and the task.
pub type CommandQueue = Channel<NoopRawMutex, PlayerCommand, COMMAND_QUEUE_DEPTH>;

/// [`Task`] wrapper around a [`StreamingEngine`].
pub struct PlaybackTask<'a, St: Storage, S: AudioSink, const N: usize> {
    engine: StreamingEngine<'a, St, S, N>,
    commands: &'a CommandQueue,
    last: PollOutcome,
    volume: VolumePercent,
    failed_commands: u32,
}

impl<'a, St: Storage, S: AudioSink, const N: usize> PlaybackTask<'a, St, S, N> {
    /// Wrap `engine`, taking commands from `commands`.
    pub fn new(engine: StreamingEngine<'a, St, S, N>, commands: &'a CommandQueue) -> Self {
        Self {
            engine,
            commands,
            last: PollOutcome::Idle,
            volume: VolumePercent::MAX,
            failed_commands: 0,
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &StreamingEngine<'a, St, S, N> {
        &self.engine
    }

    /// The wrapped engine, mutably.
    pub fn engine_mut(&mut self) -> &mut StreamingEngine<'a, St, S, N> {
        &mut self.engine
    }

    /// What the most recent engine poll did.
    pub fn last_outcome(&self) -> PollOutcome {
        self.last
    }

    /// Last volume the sink accepted.
    pub fn volume(&self) -> VolumePercent {
        self.volume
    }

    /// Commands the engine rejected since start-up.
    pub fn failed_commands(&self) -> u32 {
        self.failed_commands
    }

    /// Apply one command. Returns `false` if the engine rejected it.
    pub fn handle(&mut self, command: PlayerCommand) -> bool {
        let ok = match command {
            PlayerCommand::Play(path) => match self.engine.play_file(&path) {
                Ok(()) => true,
                Err(e) => {
                    warn!("play {} failed: {}", path.as_str(), e);
                    false
                }
            },
            PlayerCommand::Pause => self.engine.pause().is_ok(),
            PlayerCommand::Resume => self.engine.resume().is_ok(),
            PlayerCommand::Stop => {
                self.engine.stop();
                true
            }
            PlayerCommand::SetVolume(volume) => self.apply_volume(volume),
            PlayerCommand::VolumeUp => self.apply_volume(self.volume.step_up(VOLUME_STEP)),
            PlayerCommand::VolumeDown => self.apply_volume(self.volume.step_down(VOLUME_STEP)),
        };
        if !ok {
            self.failed_commands = self.failed_commands.saturating_add(1);
        }
        ok
    }

    fn apply_volume(&mut self, volume: VolumePercent) -> bool {
        match self.engine.set_volume(volume) {
            Ok(()) => {
                debug!("volume {}%", volume.get());
                self.volume = volume;
                true
            }
            Err(e) => {
                warn!("volume {}% rejected: {}", volume.get(), e);
                false
            }
        }
    }

    fn geometry_ok(&self) -> bool {
        let buffer = self.engine.buffer();
        let view = buffer.transfer_view();
        buffer.len() == N
            && N % 4 == 0
            && view.len_bytes() == N
            && view.as_ptr().align_offset(32) == 0
    }
}

impl<St: Storage, S: AudioSink, const N: usize> Task for PlaybackTask<'_, St, S, N> {
    fn label(&self) -> &'static str {
        "playback"
    }

    fn self_test(&mut self) -> bool {
        let idle = self.engine.state() == PlaybackState::Idle;
        if !idle {
            warn!("playback engine not idle at self test");
        }
        let geometry = self.geometry_ok();
        if !geometry {
            warn!("audio buffer geometry invalid ({} bytes)", N);
        }
        idle && geometry
    }

    fn poll(&mut self) {
        while let Ok(command) = self.commands.try_receive() {
            self.handle(command);
        }
        self.last = self.engine.poll();
    }
}
