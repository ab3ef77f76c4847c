//! Desktop WAV player
//!
//! Runs the firmware task set against files under `MUSIC_PATH` (default: the
//! current directory) with the emulated sink keeping time. Commands are read
//! from stdin, one per line:
//!
//! ```text
//! play <path>   pause   resume   stop   vol <0-100|+|->   quit
//! ```
//!
//! `play` ends the current file before starting the new one. Closing stdin
//! leaves the player running; only `quit` exits.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::cell::Cell;
use std::convert::Infallible;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use embedded_hal::digital::{ErrorType, OutputPin};
use firmware::emulator::EmulatedSink;
use firmware::{App, CommandQueue, HeartbeatTask, PlaybackTask, PlayerCommand, Precondition, Task};
use platform::config::{self, AUDIO_BUFFER_BYTES, MAX_TASKS};
use platform::storage_local::LocalFileStorage;
use platform::{Storage, VolumePercent};
use playback::{DoubleBuffer, StreamSignal, StreamingEngine};
use tracing::{info, trace, warn};
use tracing_subscriber::EnvFilter;

static SIGNAL: StreamSignal = StreamSignal::new();

/// Idle time per scheduler pass so the host loop does not spin a core.
const PASS_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, PartialEq, Eq)]
enum ConsoleLine {
    Command(PlayerCommand),
    Quit,
}

fn parse_line(line: &str) -> Option<ConsoleLine> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, Some(rest.trim())),
        None => (line, None),
    };
    let command = match (verb, arg) {
        ("play", Some(path)) => PlayerCommand::play(path)?,
        ("pause", None) => PlayerCommand::Pause,
        ("resume", None) => PlayerCommand::Resume,
        ("stop", None) => PlayerCommand::Stop,
        ("vol", Some("+")) => PlayerCommand::VolumeUp,
        ("vol", Some("-")) => PlayerCommand::VolumeDown,
        ("vol", Some(level)) => {
            PlayerCommand::SetVolume(VolumePercent::try_new(level.parse().ok()?).ok()?)
        }
        ("quit" | "q", None) => return Some(ConsoleLine::Quit),
        _ => return None,
    };
    Some(ConsoleLine::Command(command))
}

/// Forwards stdin lines to the playback command queue.
struct ConsoleTask<'q> {
    /// `None` once stdin has closed.
    lines: Option<Receiver<String>>,
    commands: &'q CommandQueue,
    quit: &'q Cell<bool>,
}

impl Task for ConsoleTask<'_> {
    fn label(&self) -> &'static str {
        "console"
    }

    fn poll(&mut self) {
        let Some(lines) = &self.lines else { return };
        let line = match lines.try_recv() {
            Ok(line) => line,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                info!("stdin closed, console input disabled");
                self.lines = None;
                return;
            }
        };
        match parse_line(&line) {
            Some(ConsoleLine::Command(command)) => {
                // The engine refuses to start over an active session.
                let stop_failed = matches!(command, PlayerCommand::Play(_))
                    && self.commands.try_send(PlayerCommand::Stop).is_err();
                if stop_failed || self.commands.try_send(command).is_err() {
                    warn!("command queue full, dropped {:?}", line);
                }
            }
            Some(ConsoleLine::Quit) => self.quit.set(true),
            None if line.trim().is_empty() => {}
            None => warn!("unknown command {:?}", line),
        }
    }
}

/// Status LED stand-in that logs its level.
struct LogPin;

impl ErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        trace!("heartbeat off");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        trace!("heartbeat on");
        Ok(())
    }
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawning stdin reader")?;
    Ok(rx)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let storage = LocalFileStorage::from_env().unwrap_or_else(|| LocalFileStorage::new("."));
    let mounted = storage.is_mounted();

    let mut buffer = Box::new(DoubleBuffer::<AUDIO_BUFFER_BYTES>::new());
    let engine = StreamingEngine::new(&SIGNAL, &mut buffer, storage, EmulatedSink::new(&SIGNAL));
    let commands = CommandQueue::new();
    let quit = Cell::new(false);

    if let Some(path) = std::env::args().nth(1) {
        let Some(play) = PlayerCommand::play(&path) else {
            bail!("path too long: {path}");
        };
        if commands.try_send(play).is_err() {
            bail!("command queue unavailable");
        }
    }

    let mut playback = PlaybackTask::new(engine, &commands);
    let mut heartbeat = HeartbeatTask::new(LogPin);
    let mut console = ConsoleTask {
        lines: Some(spawn_stdin_reader()?),
        commands: &commands,
        quit: &quit,
    };

    let mut app: App<'_, MAX_TASKS> = App::new();
    app.register(&mut playback)?;
    app.register(&mut heartbeat)?;
    app.register(&mut console)?;

    app.init();
    let report = app.self_test(&[Precondition::new("storage mounted", mounted)]);
    if !report.passed() {
        bail!("self test failed: {:?}", report.failed);
    }

    while !quit.get() {
        app.run_pass();
        thread::sleep(PASS_SLEEP);
    }
    info!("bye");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_console_commands() {
        assert_eq!(
            parse_line("play /my song.wav"),
            Some(ConsoleLine::Command(PlayerCommand::play("/my song.wav").unwrap()))
        );
        assert_eq!(parse_line(" pause "), Some(ConsoleLine::Command(PlayerCommand::Pause)));
        assert_eq!(
            parse_line("vol 40"),
            Some(ConsoleLine::Command(PlayerCommand::SetVolume(VolumePercent::new(40))))
        );
        assert_eq!(parse_line("vol +"), Some(ConsoleLine::Command(PlayerCommand::VolumeUp)));
        assert_eq!(parse_line("vol -"), Some(ConsoleLine::Command(PlayerCommand::VolumeDown)));
        assert_eq!(parse_line("q"), Some(ConsoleLine::Quit));
    }

    fn console<'q>(
        commands: &'q CommandQueue,
        quit: &'q Cell<bool>,
    ) -> (mpsc::Sender<String>, ConsoleTask<'q>) {
        let (tx, rx) = mpsc::channel();
        let task = ConsoleTask {
            lines: Some(rx),
            commands,
            quit,
        };
        (tx, task)
    }

    #[test]
    fn play_line_stops_before_playing() {
        let commands = CommandQueue::new();
        let quit = Cell::new(false);
        let (tx, mut task) = console(&commands, &quit);

        tx.send("play /b.wav".into()).unwrap();
        task.poll();

        assert_eq!(commands.try_receive().unwrap(), PlayerCommand::Stop);
        assert_eq!(
            commands.try_receive().unwrap(),
            PlayerCommand::play("/b.wav").unwrap()
        );
        assert!(commands.try_receive().is_err());
    }

    #[test]
    fn closed_stdin_keeps_running() {
        let commands = CommandQueue::new();
        let quit = Cell::new(false);
        let (tx, mut task) = console(&commands, &quit);

        tx.send("pause".into()).unwrap();
        drop(tx);
        task.poll();
        task.poll();
        task.poll();

        assert!(!quit.get());
        assert!(task.lines.is_none());
        assert_eq!(commands.try_receive().unwrap(), PlayerCommand::Pause);
    }

    #[test]
    fn quit_line_sets_flag() {
        let commands = CommandQueue::new();
        let quit = Cell::new(false);
        let (tx, mut task) = console(&commands, &quit);

        tx.send("quit".into()).unwrap();
        task.poll();
        assert!(quit.get());
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(parse_line("vol 101"), None);
        assert_eq!(parse_line("vol loud"), None);
        assert_eq!(parse_line("play"), None);
        assert_eq!(parse_line("stop now"), None);
        assert_eq!(parse_line(""), None);
    }
}
