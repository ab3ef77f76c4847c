// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
#![allow(missing_docs)]

mod check;
mod gen_wav;
mod play;
mod step;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "SD WAV player development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the no_std core for the target and the emulator for the host
    Check,
    /// Run tests (unit, integration, emulator and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Write a PCM sine-tone WAV for the emulator
    GenWav {
        /// Output file
        #[arg(short, long, default_value = "music/tone.wav")]
        out: PathBuf,
        /// Tone frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        freq: f32,
        /// Length in seconds
        #[arg(long, default_value_t = 3.0)]
        seconds: f32,
        /// Sample rate in Hz
        #[arg(long, default_value_t = 44_100)]
        rate: u32,
        /// 1 (mono) or 2 (stereo)
        #[arg(long, default_value_t = 2)]
        channels: u16,
        /// 8 or 16
        #[arg(long, default_value_t = 16)]
        bits: u16,
    },
    /// Run the desktop player against a local music directory
    Play {
        /// Directory served as the storage root (sets MUSIC_PATH)
        #[arg(long, default_value = "music")]
        music_path: PathBuf,
        /// File to start with, relative to the music directory
        file: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::GenWav {
            out,
            freq,
            seconds,
            rate,
            channels,
            bits,
        } => gen_wav::run(
            &out,
            &gen_wav::Tone {
                freq,
                seconds,
                rate,
                channels,
                bits,
            },
        ),
        Commands::Play { music_path, file } => play::run(&music_path, file.as_deref()),
    }
}
