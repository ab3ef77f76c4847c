//! Canonical 44-byte RIFF/WAVE header.
//!
//! Only the fixed leading layout is understood: `RIFF` descriptor, a 16-byte
//! `fmt ` chunk and the `data` chunk header, all little-endian. Files with
//! extra chunks between `fmt ` and `data` are not rejected, but their chunk
//! bytes are streamed as audio.

use platform::AudioConfig;

/// Size of the leading header in bytes.
pub const HEADER_LEN: usize = 44;

/// `audio_format` code for linear PCM.
pub const FORMAT_PCM: u16 = 1;

/// Header validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderError {
    /// `byte_rate` is zero, so no duration can be derived.
    #[error("byte rate is zero")]
    ZeroByteRate,
    /// The payload is not linear PCM.
    #[error("audio format {0} is not linear PCM")]
    NotPcm(u16),
}

/// Parsed leading header of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavHeader {
    /// `RIFF` chunk tag.
    pub riff: [u8; 4],
    /// Declared file size.
    pub file_size: u32,
    /// `WAVE` format tag.
    pub wave: [u8; 4],
    /// `fmt ` chunk tag.
    pub fmt: [u8; 4],
    /// Size of the `fmt ` chunk body.
    pub fmt_size: u32,
    /// Format code, [`FORMAT_PCM`] for linear PCM.
    pub audio_format: u16,
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bytes per second of audio.
    pub byte_rate: u32,
    /// Bytes per frame, all channels.
    pub block_align: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// `data` chunk tag.
    pub data: [u8; 4],
    /// Declared payload size.
    pub data_size: u32,
}

impl WavHeader {
    /// Decode the fixed layout. No field is checked here.
    #[must_use]
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let tag = |at: usize| -> [u8; 4] {
            let mut out = [0u8; 4];
            if let Some(src) = bytes.get(at..at.saturating_add(4)) {
                out.copy_from_slice(src);
            }
            out
        };
        let u32_at = |at: usize| u32::from_le_bytes(tag(at));
        let u16_at = |at: usize| {
            let mut out = [0u8; 2];
            if let Some(src) = bytes.get(at..at.saturating_add(2)) {
                out.copy_from_slice(src);
            }
            u16::from_le_bytes(out)
        };

        Self {
            riff: tag(0),
            file_size: u32_at(4),
            wave: tag(8),
            fmt: tag(12),
            fmt_size: u32_at(16),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data: tag(36),
            data_size: u32_at(40),
        }
    }

    /// Check the fields the engine depends on.
    ///
    /// # Errors
    ///
    /// [`HeaderError::NotPcm`] for a compressed or float payload,
    /// [`HeaderError::ZeroByteRate`] when no timing can be derived.
    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.audio_format != FORMAT_PCM {
            return Err(HeaderError::NotPcm(self.audio_format));
        }
        if self.byte_rate == 0 {
            return Err(HeaderError::ZeroByteRate);
        }
        Ok(())
    }

    /// First chunk tag that does not match the canonical layout, if any.
    #[must_use]
    pub fn mismatched_tag(&self) -> Option<[u8; 4]> {
        [
            (self.riff, *b"RIFF"),
            (self.wave, *b"WAVE"),
            (self.fmt, *b"fmt "),
            (self.data, *b"data"),
        ]
        .into_iter()
        .find(|(found, expected)| found != expected)
        .map(|(found, _)| found)
    }

    /// Audio bytes following the header, from the declared file size.
    #[must_use]
    pub fn payload_len(&self) -> u32 {
        self.file_size
            .saturating_sub(u32::try_from(HEADER_LEN).unwrap_or(u32::MAX))
    }

    /// Sink configuration for this stream.
    #[must_use]
    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bit_depth: self.bits_per_sample,
        }
    }

    /// Encode back into the fixed layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let mut put = |at: usize, bytes: &[u8]| {
            if let Some(dst) = out.get_mut(at..at.saturating_add(bytes.len())) {
                dst.copy_from_slice(bytes);
            }
        };
        put(0, &self.riff);
        put(4, &self.file_size.to_le_bytes());
        put(8, &self.wave);
        put(12, &self.fmt);
        put(16, &self.fmt_size.to_le_bytes());
        put(20, &self.audio_format.to_le_bytes());
        put(22, &self.channels.to_le_bytes());
        put(24, &self.sample_rate.to_le_bytes());
        put(28, &self.byte_rate.to_le_bytes());
        put(32, &self.block_align.to_le_bytes());
        put(34, &self.bits_per_sample.to_le_bytes());
        put(36, &self.data);
        put(40, &self.data_size.to_le_bytes());
        out
    }

    /// Canonical PCM header for `data_len` payload bytes.
    ///
    /// `file_size` is written as header plus payload, which is what the
    /// engine uses to derive the stream length.
    #[must_use]
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16, data_len: u32) -> Self {
        let block_align = channels.saturating_mul(bits_per_sample / 8);
        Self {
            riff: *b"RIFF",
            file_size: data_len.saturating_add(u32::try_from(HEADER_LEN).unwrap_or(u32::MAX)),
            wave: *b"WAVE",
            fmt: *b"fmt ",
            fmt_size: 16,
            audio_format: FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(u32::from(block_align)),
            block_align,
            bits_per_sample,
            data: *b"data",
            data_size: data_len,
        }
    }
}
