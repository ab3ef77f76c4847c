use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Command;

/// Build and run `host_player` with `music_path` as its storage root.
pub fn run(music_path: &Path, file: Option<&str>) -> Result<()> {
    if !music_path.is_dir() {
        anyhow::bail!(
            "{} is not a directory (try `cargo xtask gen-wav` first)",
            music_path.display()
        );
    }
    let music_path = music_path
        .canonicalize()
        .with_context(|| format!("resolving {}", music_path.display()))?;

    println!();
    println!("{}", "🎵 Starting host player...".cyan().bold());
    println!("{}", format!("  Music: {}", music_path.display()).cyan());
    println!("{}", "  Commands: play <path> | pause | resume | stop | vol <0-100|+|-> | quit".cyan());
    println!();

    let mut cmd = Command::new("cargo");
    cmd.args([
        "run",
        "-p",
        "firmware",
        "--bin",
        "host_player",
        "--features",
        "emulator",
    ])
    .env("MUSIC_PATH", &music_path);
    if std::env::var_os("RUST_LOG").is_none() {
        cmd.env("RUST_LOG", "info");
    }
    if let Some(file) = file {
        cmd.arg("--").arg(file);
    }

    let status = cmd.status().context("Failed to run host player")?;
    if !status.success() {
        anyhow::bail!("host player exited with {status}");
    }
    Ok(())
}
