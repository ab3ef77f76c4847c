//! Ping-pong audio buffer shared with the sink's DMA.
//!
//! One contiguous `N`-byte region, transmitted in a loop by the sink, split into
//! two equal halves. While the sink plays one half the other is refilled, so
//! the engine only ever needs write access to a single half. [`half_mut`]
//! hands out exactly that half through a pointer derived from the
//! `UnsafeCell`, never a reference covering the region the DMA is reading.
//!
//! [`half_mut`]: DoubleBuffer::half_mut

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use platform::TransferView;

/// One half of a [`DoubleBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Half {
    /// Bytes `0..N/2`.
    First,
    /// Bytes `N/2..N`.
    Second,
}

impl Half {
    /// The half the sink plays while this one is refilled.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    pub(crate) fn from_bit(bit: u32) -> Self {
        if bit & 1 == 0 {
            Self::First
        } else {
            Self::Second
        }
    }

    pub(crate) fn bit(self) -> u32 {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// `N`-byte DMA buffer, 32-byte aligned for cache maintenance on the
/// transmit path.
#[repr(C, align(32))]
pub struct DoubleBuffer<const N: usize> {
    bytes: UnsafeCell<[u8; N]>,
}

impl<const N: usize> DoubleBuffer<N> {
    /// Bytes per half.
    pub const HALF: usize = N / 2;

    const GEOMETRY_OK: () = assert!(
        N > 0 && N % 2 == 0,
        "DoubleBuffer size must be even and non-zero"
    );

    /// Create a zeroed buffer.
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::GEOMETRY_OK;
        Self {
            bytes: UnsafeCell::new([0; N]),
        }
    }

    /// Total size in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Always `false`; the geometry check forbids `N == 0`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    fn offset(half: Half) -> usize {
        match half {
            Half::First => 0,
            Half::Second => Self::HALF,
        }
    }

    /// Mutable access to one half only.
    pub fn half_mut(&mut self, half: Half) -> &mut [u8] {
        let base = self.bytes.get().cast::<u8>();
        // SAFETY: `offset + HALF <= N`, so the range lies inside the array.
        // Only the requested half is covered, so the DMA may keep reading the
        // other one through its view.
        unsafe { core::slice::from_raw_parts_mut(base.add(Self::offset(half)), Self::HALF) }
    }

    /// Read one half.
    #[must_use]
    pub fn half(&self, half: Half) -> &[u8] {
        let base = self.bytes.get().cast::<u8>().cast_const();
        // SAFETY: in-bounds as for `half_mut`. Writes only happen through
        // `&mut self`, which cannot coexist with this borrow.
        unsafe { core::slice::from_raw_parts(base.add(Self::offset(half)), Self::HALF) }
    }

    /// Fill `half` from `read`, zero-padding whatever it leaves unwritten.
    ///
    /// `read` gets the half truncated to `limit` bytes and returns how many it
    /// wrote. The return value is clamped to the space offered.
    pub fn fill_half(
        &mut self,
        half: Half,
        limit: usize,
        read: impl FnOnce(&mut [u8]) -> usize,
    ) -> usize {
        fill_padded(self.half_mut(half), limit, read)
    }

    /// Fill the whole buffer the same way as [`fill_half`](Self::fill_half).
    ///
    /// Takes `&mut self` over both halves, so it is only used before the sink
    /// has been started.
    pub fn fill_whole(&mut self, limit: usize, read: impl FnOnce(&mut [u8]) -> usize) -> usize {
        fill_padded(self.bytes.get_mut(), limit, read)
    }

    /// View of the whole buffer for the sink.
    pub fn transfer_view(&self) -> TransferView {
        let ptr = NonNull::from(&self.bytes).cast::<u8>();
        // SAFETY: the engine holds `&'a mut DoubleBuffer`, so the memory stays
        // put for the lifetime of every transfer it starts, and it stops the
        // sink before that borrow ends.
        unsafe { TransferView::from_raw(ptr, N) }
    }
}

fn fill_padded(dst: &mut [u8], limit: usize, read: impl FnOnce(&mut [u8]) -> usize) -> usize {
    let want = limit.min(dst.len());
    let written = dst.get_mut(..want).map_or(0, |head| read(head).min(want));
    if let Some(tail) = dst.get_mut(written..) {
        tail.fill(0);
    }
    written
}

impl<const N: usize> Default for DoubleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
