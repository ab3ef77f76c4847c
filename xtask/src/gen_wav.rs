//! xtask gen-wav: write a test tone the player can stream.
//!
//! The header is produced by the same `WavHeader` the engine parses, so the
//! file's declared size always matches what the player will compute.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use platform::AudioConfig;
use playback::WavHeader;

/// Tone parameters.
pub struct Tone {
    pub freq: f32,
    pub seconds: f32,
    pub rate: u32,
    pub channels: u16,
    pub bits: u16,
}

/// Full-scale fraction of the generated sine.
const AMPLITUDE: f32 = 0.5;

pub fn run(out: &Path, tone: &Tone) -> Result<()> {
    let bytes = render(tone)?;
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    println!(
        "{}",
        format!(
            "✓ Wrote {} ({} Hz, {} ch, {} bit, {:.1}s, {} bytes)",
            out.display(),
            tone.rate,
            tone.channels,
            tone.bits,
            tone.seconds,
            bytes.len()
        )
        .green()
    );
    Ok(())
}

/// Header plus interleaved PCM for `tone`.
pub fn render(tone: &Tone) -> Result<Vec<u8>> {
    let config = AudioConfig {
        sample_rate: tone.rate,
        channels: tone.channels,
        bit_depth: tone.bits,
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("unsupported format: {e}"))?;
    if !matches!(tone.bits, 8 | 16) {
        bail!("gen-wav writes 8 or 16 bit PCM, not {}", tone.bits);
    }
    if !(tone.seconds.is_finite() && tone.seconds > 0.0) {
        bail!("length must be positive");
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let frames = (f64::from(tone.seconds) * f64::from(tone.rate)).round() as u64;
    let bytes_per_frame = u64::from(tone.channels) * u64::from(tone.bits / 8);
    let data_len = u32::try_from(frames * bytes_per_frame)
        .ok()
        .filter(|&len| len <= u32::MAX - 44)
        .context("tone too long for a RIFF file")?;

    let mut bytes = WavHeader::pcm(tone.rate, tone.channels, tone.bits, data_len)
        .to_bytes()
        .to_vec();
    bytes.reserve(data_len as usize);

    let step = 2.0 * std::f64::consts::PI * f64::from(tone.freq) / f64::from(tone.rate);
    for frame in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let value = (step * frame as f64).sin() * f64::from(AMPLITUDE);
        for _ in 0..tone.channels {
            push_sample(&mut bytes, value, tone.bits);
        }
    }
    Ok(bytes)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn push_sample(out: &mut Vec<u8>, value: f64, bits: u16) {
    if bits == 8 {
        // 8-bit PCM is unsigned around 128.
        out.push((128.0 + value * 127.0).round() as u8);
    } else {
        let sample = (value * f64::from(i16::MAX)).round() as i16;
        out.extend_from_slice(&sample.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(bits: u16, channels: u16) -> Tone {
        Tone {
            freq: 1_000.0,
            seconds: 0.5,
            rate: 8_000,
            channels,
            bits,
        }
    }

    #[test]
    fn header_matches_payload() {
        let bytes = render(&tone(16, 2)).unwrap();
        let header = WavHeader::parse(bytes[..44].try_into().unwrap());
        header.validate().unwrap();
        assert_eq!(header.payload_len() as usize, bytes.len() - 44);
        assert_eq!(header.payload_len(), 4_000 * 2 * 2);
        assert_eq!(header.byte_rate, 32_000);
    }

    #[test]
    fn eight_bit_is_centred_on_128() {
        let bytes = render(&tone(8, 1)).unwrap();
        assert_eq!(bytes[44], 128);
        let data = &bytes[44..];
        assert!(data.iter().all(|&b| (64..=192).contains(&b)));
    }

    #[test]
    fn rejects_unsupported_formats() {
        assert!(render(&tone(24, 2)).is_err());
        assert!(render(&tone(16, 3)).is_err());
        let mut zero = tone(16, 1);
        zero.seconds = 0.0;
        assert!(render(&zero).is_err());
    }

    #[test]
    fn creates_parent_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("music/tone.wav");
        run(&out, &tone(8, 1)).unwrap();
        assert_eq!(fs::metadata(&out).unwrap().len(), 44 + 4_000);
    }
}
