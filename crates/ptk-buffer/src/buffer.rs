use crate::{cursor::Cursor, error::BufferError};

/// Growable byte storage with independent read and write indices.
///
/// `[read_index, write_index)` is the valid payload; `capacity` bounds
/// `write_index`. Every operation either succeeds and moves an index, or
/// fails and leaves the buffer exactly as it was — there is no partial
/// write/read path.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    read_index: usize,
    write_index: usize,
}

impl Buffer {
    #[inline]
    pub fn allocate(capacity: usize) -> Self {
        Self { data: vec![0; capacity], read_index: 0, write_index: 0 }
    }

    /// Adopts a caller-provided allocation. `write_index` starts at the end
    /// of `data`'s current length, `read_index` at zero — the buffer is
    /// treated as full of valid payload. Capacity grows via [`Self::reserve`].
    pub fn from_vec(mut data: Vec<u8>) -> Self {
        let write_index = data.len();
        data.resize(data.len().max(write_index), 0);
        Self { data, read_index: 0, write_index }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.write_index - self.read_index
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free space left for writes before the buffer needs a [`Self::trim`] or
    /// [`Self::reserve`].
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.write_index
    }

    /// Resets both indices to zero without freeing the allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
    }

    /// Grows the backing allocation so `remaining() >= extra`, without
    /// touching either index.
    pub fn reserve(&mut self, extra: usize) {
        if self.remaining() < extra {
            self.data.resize(self.write_index + extra, 0);
        }
    }

    /// Shifts `[read_index, write_index)` down to offset zero, resetting
    /// `read_index` to zero and `write_index` to the payload length.
    pub fn trim(&mut self) {
        if self.read_index == 0 {
            return;
        }
        self.data.copy_within(self.read_index..self.write_index, 0);
        self.write_index -= self.read_index;
        self.read_index = 0;
    }

    /// Appends `src` and advances `write_index`. Fails with
    /// [`BufferError::BufferTooSmall`] if `src` doesn't fit in the remaining
    /// capacity; the buffer is unchanged on failure.
    pub fn write(&mut self, src: &[u8]) -> Result<(), BufferError> {
        if src.len() > self.remaining() {
            return Err(BufferError::BufferTooSmall);
        }
        let end = self.write_index + src.len();
        self.data[self.write_index..end].copy_from_slice(src);
        self.write_index = end;
        Ok(())
    }

    /// Copies `n` bytes into `dst` and advances `read_index`. Fails if fewer
    /// than `n` bytes are valid; the buffer is unchanged on failure.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<(), BufferError> {
        self.peek(dst)?;
        self.read_index += dst.len();
        Ok(())
    }

    /// Like [`Self::read`] but does not advance `read_index`.
    pub fn peek(&self, dst: &mut [u8]) -> Result<(), BufferError> {
        if dst.len() > self.len() {
            return Err(BufferError::BufferTooSmall);
        }
        let start = self.read_index;
        dst.copy_from_slice(&self.data[start..start + dst.len()]);
        Ok(())
    }

    /// Advances `write_index` by `n` without copying — for callers (the
    /// reactor's socket reads) that write directly into
    /// [`Self::spare_write_slice`].
    pub fn advance_write(&mut self, n: usize) -> Result<(), BufferError> {
        if n > self.remaining() {
            return Err(BufferError::BufferTooSmall);
        }
        self.write_index += n;
        Ok(())
    }

    /// Advances `read_index` by `n` without copying.
    pub fn advance_read(&mut self, n: usize) -> Result<(), BufferError> {
        if n > self.len() {
            return Err(BufferError::BufferTooSmall);
        }
        self.read_index += n;
        Ok(())
    }

    /// The valid payload region, borrowed.
    #[inline]
    pub fn as_read_slice(&self) -> &[u8] {
        &self.data[self.read_index..self.write_index]
    }

    /// The free region past `write_index`, for a socket read to fill
    /// directly before calling [`Self::advance_write`].
    #[inline]
    pub fn spare_write_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.write_index..]
    }

    /// A read-only cursor bound to the current valid payload.
    #[inline]
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.as_read_slice())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::allocate(0)
    }
}
