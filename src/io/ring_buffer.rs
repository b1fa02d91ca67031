//! Fixed capacity FIFO.
//!
//! Every sample is written twice, at its slot and one capacity further, so
//! the queued samples can always be read as one contiguous slice.

use alloc::boxed::Box;
use alloc::vec;

#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    data: Box<[T]>,
    read_ptr: usize,
    len: usize,
}

impl<T, const N: usize> Default for RingBuffer<T, N>
where
    T: Copy + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> RingBuffer<T, N>
where
    T: Copy + Default,
{
    pub fn new() -> Self {
        Self {
            data: vec![T::default(); N * 2].into_boxed_slice(),
            read_ptr: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Number of samples that can be pushed before the buffer is full.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Appends a sample. Returns `false` and drops it if the buffer is full.
    #[inline]
    pub fn push(&mut self, value: T) -> bool {
        if self.is_full() {
            return false;
        }

        let write_ptr = (self.read_ptr + self.len) % N;
        self.data[write_ptr] = value;
        self.data[write_ptr + N] = value;
        self.len += 1;

        true
    }

    /// Appends as many samples from `values` as fit. Returns how many did.
    pub fn extend(&mut self, values: &[T]) -> usize {
        let count = values.len().min(self.free());
        for &value in &values[..count] {
            self.push(value);
        }

        count
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = self.data[self.read_ptr];
        self.consume(1);

        Some(value)
    }

    /// Queued samples, oldest first.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data[self.read_ptr..self.read_ptr + self.len]
    }

    /// Discards up to `count` of the oldest samples.
    #[inline]
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.len);
        self.read_ptr = (self.read_ptr + count) % N;
        self.len -= count;
    }

    pub fn clear(&mut self) {
        self.read_ptr = 0;
        self.len = 0;
    }
}
