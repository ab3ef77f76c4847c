//! DMA buffer views
//!
//! The engine owns the double buffer; the sink only ever receives a
//! [`TransferView`] describing it. The view carries no lifetime, so the
//! validity contract is carried by the `unsafe` constructor instead.

use core::ptr::NonNull;

/// Non-owning description of a buffer handed to a DMA transfer.
///
/// Length is in bytes. The sample count for a 16-bit transport is
/// [`len_samples`](Self::len_samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferView {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the view is a plain address and length. Whoever constructs it
// guarantees the memory outlives the transfer, which is independent of the
// thread the view travels to.
unsafe impl Send for TransferView {}

impl TransferView {
    /// Create a view over `len` bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// The memory must stay valid and must not move until the transfer
    /// using this view has been stopped.
    #[must_use]
    pub unsafe fn from_raw(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Get buffer pointer
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr().cast_const()
    }

    /// Buffer length in bytes
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.len
    }

    /// Buffer length in 16-bit transport samples.
    #[must_use]
    pub fn len_samples(&self) -> usize {
        self.len / 2
    }

    /// `true` for a zero-length view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the viewed bytes.
    ///
    /// # Safety
    ///
    /// The memory must still be valid, and nothing may be writing to the
    /// returned range for the lifetime of the slice.
    #[must_use]
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        // SAFETY: validity and absence of concurrent writers are the caller's
        // obligation, restated from `from_raw`.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().cast_const(), self.len) }
    }
}
