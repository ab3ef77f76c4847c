//! Emulated audio sink
//!
//! Stands in for the codec and its circular serial-audio transfer on the
//! desktop. A worker thread plays the role of the DMA half/full-complete
//! interrupt: it waits one half-buffer of playback time per notification,
//! derived from the configured byte rate, and publishes it through the shared
//! [`StreamSignal`] exactly as the interrupt handler would.
//!
//! No sound is produced. The sink only keeps time.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use platform::{AudioConfig, AudioSink, Restream, SinkError, TransferView, VolumePercent};
use playback::{Half, StreamSignal};

#[derive(Default)]
struct Shared {
    running: AtomicBool,
    paused: AtomicBool,
    halves_played: AtomicU64,
    loops: AtomicU64,
    volume: AtomicU8,
}

/// Circular-mode rearm as seen from the completion thread.
struct Rearm<'s>(&'s Shared);

impl Restream for Rearm<'_> {
    fn restream(&mut self) {
        self.0.loops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Wall-clock paced [`AudioSink`].
pub struct EmulatedSink {
    signal: &'static StreamSignal,
    shared: Arc<Shared>,
    config: Option<AudioConfig>,
    worker: Option<JoinHandle<()>>,
    time_scale: u32,
}

impl EmulatedSink {
    /// Create a sink that publishes completions to `signal`.
    pub fn new(signal: &'static StreamSignal) -> Self {
        let shared = Shared {
            volume: AtomicU8::new(VolumePercent::MAX.get()),
            ..Shared::default()
        };
        Self {
            signal,
            shared: Arc::new(shared),
            config: None,
            worker: None,
            time_scale: 1,
        }
    }

    /// Run `scale` times faster than real time. Useful in tests.
    #[must_use]
    pub fn with_time_scale(mut self, scale: u32) -> Self {
        self.time_scale = scale.max(1);
        self
    }

    /// Half buffers consumed since the sink was created.
    pub fn halves_played(&self) -> u64 {
        self.shared.halves_played.load(Ordering::Relaxed)
    }

    /// Times the circular transfer wrapped.
    pub fn loops(&self) -> u64 {
        self.shared.loops.load(Ordering::Relaxed)
    }

    /// Current configuration, if any.
    pub fn config(&self) -> Option<AudioConfig> {
        self.config
    }

    /// Last volume set.
    pub fn volume(&self) -> VolumePercent {
        VolumePercent::new(self.shared.volume.load(Ordering::Relaxed))
    }

    /// Playback time of one half of `view` at `config`.
    pub fn half_period(config: AudioConfig, view_bytes: usize, time_scale: u32) -> Option<Duration> {
        let byte_rate = u64::from(config.sample_rate)
            .checked_mul(u64::from(config.channels))?
            .checked_mul(u64::from(config.bit_depth))?
            .checked_div(8)?;
        let half = u64::try_from(view_bytes / 2).ok()?;
        let nanos = half
            .checked_mul(1_000_000_000)?
            .checked_div(byte_rate)?
            .checked_div(u64::from(time_scale.max(1)))?;
        Some(Duration::from_nanos(nanos))
    }

    fn join_worker(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("emulated sink worker panicked");
            }
        }
    }
}

fn run_completions(signal: &'static StreamSignal, shared: &Shared, period: Duration) {
    let mut next = Half::First;
    while shared.running.load(Ordering::Acquire) {
        thread::sleep(period);
        if shared.paused.load(Ordering::Acquire) {
            continue;
        }
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        match next {
            Half::First => signal.on_half_complete(),
            Half::Second => signal.on_full_complete(&mut Rearm(shared)),
        }
        shared.halves_played.fetch_add(1, Ordering::Relaxed);
        next = next.other();
    }
}

impl AudioSink for EmulatedSink {
    fn configure(&mut self, config: AudioConfig) -> Result<(), SinkError> {
        if self.is_active() {
            return Err(SinkError::Busy);
        }
        config.validate().map_err(|_| SinkError::Unsupported)?;
        debug!(
            "emulated sink: {} Hz, {} ch, {} bit",
            config.sample_rate,
            config.channels,
            config.bit_depth
        );
        self.config = Some(config);
        Ok(())
    }

    fn start(&mut self, view: TransferView) -> Result<(), SinkError> {
        if self.is_active() {
            return Err(SinkError::Busy);
        }
        let config = self.config.ok_or(SinkError::Unsupported)?;
        let period = Self::half_period(config, view.len_bytes(), self.time_scale)
            .ok_or(SinkError::Unsupported)?;
        // A stopped worker may still be winding down.
        self.join_worker();

        self.shared.paused.store(false, Ordering::Release);
        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let signal = self.signal;
        let worker = thread::Builder::new()
            .name("emulated-sink".into())
            .spawn(move || run_completions(signal, &shared, period))
            .map_err(|_| SinkError::Device)?;
        self.worker = Some(worker);
        info!("emulated sink started, {} byte transfer", view.len_bytes());
        Ok(())
    }

    fn stop(&mut self) {
        if self.worker.is_some() {
            self.join_worker();
            debug!("emulated sink stopped");
        }
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.shared.paused.store(true, Ordering::Release);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        self.shared.paused.store(false, Ordering::Release);
        Ok(())
    }

    fn set_volume(&mut self, volume: VolumePercent) -> Result<(), SinkError> {
        self.shared.volume.store(volume.get(), Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl Drop for EmulatedSink {
    fn drop(&mut self) {
        self.join_worker();
    }
}
