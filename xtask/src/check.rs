use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{cargo, OnFailure};

const TARGET: &str = "thumbv7em-none-eabihf";

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // The core crates must stay no_std.
    for package in ["platform", "playback", "firmware"] {
        cargo(
            &format!("Checking {package} ({TARGET}, no_std)"),
            &["check", "-p", package, "--target", TARGET, "--no-default-features"],
            OnFailure::Abort,
        )?;
    }
    cargo(
        "Checking firmware with defmt logging",
        &["check", "-p", "firmware", "--target", TARGET, "--features", "defmt"],
        OnFailure::Abort,
    )?;
    cargo(
        "Checking emulator (host)",
        &["check", "-p", "firmware", "--features", "emulator", "--all-targets"],
        OnFailure::Abort,
    )?;

    cargo(
        "Running clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;
    cargo("Checking formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?;

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
