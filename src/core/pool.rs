//! Reusable byte buffers for the formatting hot path
//!
//! A bounded channel is used as a lock-free free-list: acquiring pops a
//! buffer (or allocates one when the list is empty), dropping the guard
//! clears the buffer and pushes it back (or frees it when the list is full).

use crossbeam_channel::{bounded, Receiver, Sender};
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

/// Buffers kept for reuse by the process-wide pool
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Initial capacity of a freshly allocated buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Buffers that grew beyond this are freed instead of pooled
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

pub struct BufferPool {
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
    buffer_capacity: usize,
}

impl BufferPool {
    pub fn new(pool_size: usize, buffer_capacity: usize) -> Self {
        let (sender, receiver) = bounded(pool_size.max(1));
        Self {
            sender,
            receiver,
            buffer_capacity,
        }
    }

    /// Take a cleared buffer; it goes back to the pool when the guard drops,
    /// including during unwinding.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .receiver
            .try_recv()
            .unwrap_or_else(|_| Vec::with_capacity(self.buffer_capacity));
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    /// Number of idle buffers
    pub fn idle(&self) -> usize {
        self.receiver.len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        // full pool: let the buffer drop
        let _ = self.sender.try_send(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE, DEFAULT_BUFFER_CAPACITY)
    }
}

/// Scoped buffer borrowed from a [`BufferPool`]
pub struct PooledBuffer<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        // only taken in drop
        self.buf.as_ref().expect("pooled buffer used after release")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buf.as_mut().expect("pooled buffer used after release")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

/// Process-wide pool used by loggers and formatters
pub fn pool() -> &'static BufferPool {
    static POOL: OnceLock<BufferPool> = OnceLock::new();
    POOL.get_or_init(BufferPool::default)
}
