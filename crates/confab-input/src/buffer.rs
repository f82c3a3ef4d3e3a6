#![forbid(unsafe_code)]

//! Fixed-capacity input window over the raw byte stream.
//!
//! [`InputBuffer`] holds bytes read from the terminal descriptor between
//! decode attempts. Bytes before `consumed` are logically gone; `compact`
//! shifts the unread tail to offset 0 before each refill so an incomplete
//! escape sequence is always retried whole. Unread bytes are never dropped.
//!
//! Invariant: `consumed <= filled <= capacity`.

use std::io::{self, Read};

/// Default window size. Key and mouse sequences are tens of bytes; paste
/// payloads stream through in chunks, so the window never needs to hold a
/// whole paste.
pub const INPUT_BUFFER_CAPACITY: usize = 1024;

/// A fixed-capacity byte window with explicit consumed/filled indices.
#[derive(Debug)]
pub struct InputBuffer {
    data: Box<[u8]>,
    filled: usize,
    consumed: usize,
}

impl InputBuffer {
    /// Create a buffer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(INPUT_BUFFER_CAPACITY)
    }

    /// Create a buffer with an explicit capacity (must be non-zero).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
            filled: 0,
            consumed: 0,
        }
    }

    /// The unread slice: everything filled but not yet consumed.
    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.consumed..self.filled]
    }

    /// True when no unread bytes remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumed == self.filled
    }

    /// Mark `n` unread bytes as consumed. Clamped to the unread length.
    pub fn consume(&mut self, n: usize) {
        self.consumed = (self.consumed + n).min(self.filled);
    }

    /// Shift unread bytes to offset 0, reclaiming consumed space.
    pub fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        self.data.copy_within(self.consumed..self.filled, 0);
        self.filled -= self.consumed;
        self.consumed = 0;
    }

    /// Free space available for a refill.
    #[must_use]
    pub fn free(&self) -> usize {
        self.data.len() - self.filled
    }

    /// Read once from `reader` into the free tail. Returns the byte count
    /// (0 on EOF or when the buffer is full).
    pub fn fill_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        if self.free() == 0 {
            return Ok(0);
        }
        let n = reader.read(&mut self.data[self.filled..])?;
        self.filled += n;
        Ok(n)
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
