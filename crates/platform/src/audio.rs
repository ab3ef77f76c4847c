//! Audio sink abstraction: codec/amplifier behind a circular I2S DMA transfer

use crate::audio_types::{OutOfRangeError, SampleRateHz, VolumePercent};
use crate::dma::TransferView;

/// Errors an [`AudioSink`] may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// A transfer is already running; the sink accepts one stream at a time.
    #[error("audio sink busy")]
    Busy,
    /// The requested format or operation is not supported by this sink.
    #[error("unsupported by audio sink")]
    Unsupported,
    /// The codec, amplifier or bus reported a fault.
    #[error("audio device fault")]
    Device,
}

/// Audio sink driven from the polled context.
///
/// The sink transmits the buffer described by a [`TransferView`] continuously
/// in a loop and raises a completion notification after each half. The
/// notification handler is wired to the engine's stream signal by the board
/// glue; the sink does not call back into the engine itself.
///
/// # Buffer contract
///
/// The view passed to [`start`](AudioSink::start) stays valid until
/// [`stop`](AudioSink::stop) returns. The sink must not touch the memory after
/// that point.
pub trait AudioSink {
    /// Apply the stream format (bus clocking, word size, channel layout).
    fn configure(&mut self, config: AudioConfig) -> Result<(), SinkError>;

    /// Begin continuous transmission of `view`.
    ///
    /// Returns [`SinkError::Busy`] when a transfer is already active.
    fn start(&mut self, view: TransferView) -> Result<(), SinkError>;

    /// Stop transmission. No completion notification fires after this returns.
    /// Stopping an idle sink is a no-op.
    fn stop(&mut self);

    /// Suspend output, keeping the DMA position.
    fn pause(&mut self) -> Result<(), SinkError>;

    /// Continue output from where [`pause`](AudioSink::pause) left it.
    fn resume(&mut self) -> Result<(), SinkError>;

    /// Set the master volume on the codec/amplifier.
    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), SinkError>;

    /// `true` between a successful `start` and the next `stop`.
    fn is_active(&self) -> bool;
}

/// Re-arm hook used from the notification context.
///
/// After the second half completes, the transfer is re-armed on the same view
/// so playback wraps around to the first half. Sinks running their DMA in
/// hardware circular mode implement this as a no-op.
pub trait Restream {
    /// Restart transmission from the beginning of the current view.
    fn restream(&mut self);
}

/// Audio configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Bits per sample (8, 16, 24 or 32)
    pub bit_depth: u16,
}

impl AudioConfig {
    /// Check the configuration against what the I2S transport can clock.
    ///
    /// # Errors
    ///
    /// Returns an [`OutOfRangeError`] naming the first offending field value.
    pub fn validate(&self) -> Result<(), OutOfRangeError> {
        SampleRateHz::new(self.sample_rate)?;
        if !(1..=2).contains(&self.channels) {
            return Err(OutOfRangeError {
                value: u32::from(self.channels),
                min: 1,
                max: 2,
            });
        }
        if !matches!(self.bit_depth, 8 | 16 | 24 | 32) {
            return Err(OutOfRangeError {
                value: u32::from(self.bit_depth),
                min: 8,
                max: 32,
            });
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            bit_depth: 16,
        }
    }
}
