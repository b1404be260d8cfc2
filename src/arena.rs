//! Fixed-capacity bump allocator.
//!
//! The arena hosts short-lived parsed fragments (tag text, attribute values)
//! so the tokenizer does not hit the heap once per token. Allocations are
//! never freed individually: [`Arena::reset`] invalidates all of them at once.
//!
//! Everything handed out by [`Arena::alloc`] borrows the arena, and
//! [`Arena::reset`] takes `&mut self`, so the borrow checker rejects any
//! fragment that is still alive at the reset boundary. Callers that need a
//! value past the reset copy it into owned storage first.

use std::cell::Cell;
use std::ptr::NonNull;

/// Arena allocation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The backing buffer could not be obtained
    #[error("arena buffer could not be allocated")]
    OutOfMemory,

    /// The aligned allocation would run past the end of the buffer
    #[error("arena capacity exceeded: requested {requested} bytes, {available} available")]
    CapacityExceeded { requested: usize, available: usize },

    /// Alignment must be a non-zero power of two
    #[error("invalid alignment: {0}")]
    InvalidAlignment(usize),
}

/// Linear allocator over one contiguous buffer.
///
/// Invariant: `0 <= offset <= capacity`.
pub struct Arena {
    buffer: NonNull<u8>,
    capacity: usize,
    offset: Cell<usize>,
}

impl Arena {
    /// Allocate a zeroed backing buffer of `capacity` bytes.
    pub fn init(capacity: usize) -> Result<Self, ArenaError> {
        let mut storage: Vec<u8> = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| ArenaError::OutOfMemory)?;
        storage.resize(capacity, 0);

        let raw = Box::into_raw(storage.into_boxed_slice());
        // Box never hands out a null pointer, even for an empty slice.
        let buffer = NonNull::new(raw.cast::<u8>()).ok_or(ArenaError::OutOfMemory)?;

        Ok(Self {
            buffer,
            capacity,
            offset: Cell::new(0),
        })
    }

    /// Carve `size` bytes aligned to `alignment` out of the buffer.
    ///
    /// On failure the offset is left untouched.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc(&self, size: usize, alignment: usize) -> Result<&mut [u8], ArenaError> {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment(alignment));
        }

        let base = self.buffer.as_ptr() as usize;
        let current = base + self.offset.get();
        let aligned = current
            .checked_add(alignment - 1)
            .map(|addr| addr & !(alignment - 1))
            .ok_or(ArenaError::CapacityExceeded {
                requested: size,
                available: self.remaining(),
            })?;
        let start = aligned - base;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= self.capacity)
            .ok_or(ArenaError::CapacityExceeded {
                requested: size,
                available: self.remaining(),
            })?;

        self.offset.set(end);

        // SAFETY: `start..end` lies inside the buffer and past every range
        // handed out since the last reset. The offset only moves forward
        // until `reset`, which needs `&mut self` and therefore cannot run
        // while any returned slice is still borrowed.
        let slice = unsafe {
            std::slice::from_raw_parts_mut(self.buffer.as_ptr().add(start), size)
        };
        Ok(slice)
    }

    /// Copy `text` into the arena.
    pub fn alloc_str(&self, text: &str) -> Result<&str, ArenaError> {
        let slot = self.alloc(text.len(), std::mem::align_of::<u8>())?;
        slot.copy_from_slice(text.as_bytes());
        // SAFETY: the bytes were copied verbatim from a `&str`.
        Ok(unsafe { std::str::from_utf8_unchecked(slot) })
    }

    /// Invalidate every allocation at once.
    pub fn reset(&mut self) {
        self.offset.set(0);
    }

    /// Give the backing buffer back to the system.
    pub fn release(self) {
        drop(self);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed since the last reset, alignment padding included.
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.buffer.as_ptr(), self.capacity);
        // SAFETY: `buffer`/`capacity` came from `Box::into_raw` in `init`
        // and are reclaimed exactly once.
        drop(unsafe { Box::from_raw(slice) });
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("offset", &self.offset.get())
            .finish()
    }
}
