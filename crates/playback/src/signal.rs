//! Completion handoff from the sink's interrupt to the polled engine.
//!
//! A single `AtomicU32` holds `(sequence << 1) | half`. The interrupt handler
//! is the only writer and publishes with one plain store, so a reader always
//! sees a matching (sequence, half) pair. The engine never writes the word; it
//! remembers the last sequence it serviced instead, which is what lets it tell
//! "one refill due" apart from "a refill was missed".

use core::sync::atomic::{AtomicU32, Ordering};

use platform::Restream;

use crate::double_buffer::Half;

/// Sequence numbers are 31 bits wide and wrap.
pub(crate) const SEQ_MASK: u32 = u32::MAX >> 1;

/// One observation of the signal word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notification {
    /// Number of completions published so far, modulo 2^31.
    pub sequence: u32,
    /// Half that finished playing and is now due for refill.
    pub half: Half,
}

impl Notification {
    /// Completions published after sequence `serviced`.
    #[must_use]
    pub fn pending_since(&self, serviced: u32) -> u32 {
        self.sequence.wrapping_sub(serviced) & SEQ_MASK
    }
}

/// Lock-free completion flag shared between the sink interrupt and the engine.
///
/// Place it in a `static` so the interrupt handler can reach it:
///
/// ```
/// use playback::StreamSignal;
///
/// static SIGNAL: StreamSignal = StreamSignal::new();
///
/// // I2S DMA half-transfer interrupt:
/// SIGNAL.on_half_complete();
/// assert_eq!(SIGNAL.snapshot().sequence, 1);
/// ```
pub struct StreamSignal {
    word: AtomicU32,
}

impl StreamSignal {
    /// No completions yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// The first half has played out.
    pub fn on_half_complete(&self) {
        self.publish(Half::First);
    }

    /// The second half has played out; re-arm the sink so it wraps to the
    /// first half.
    pub fn on_full_complete<R: Restream + ?Sized>(&self, sink: &mut R) {
        self.publish(Half::Second);
        sink.restream();
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> Notification {
        let word = self.word.load(Ordering::Acquire);
        Notification {
            sequence: word >> 1,
            half: Half::from_bit(word),
        }
    }

    fn publish(&self, half: Half) {
        // Sole writer: a plain load/store pair, no read-modify-write needed.
        let sequence = (self.word.load(Ordering::Relaxed) >> 1).wrapping_add(1) & SEQ_MASK;
        self.word.store((sequence << 1) | half.bit(), Ordering::Release);
    }
}

impl Default for StreamSignal {
    fn default() -> Self {
        Self::new()
    }
}
