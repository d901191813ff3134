//! Single-producer/single-consumer byte ring.
//!
//! The ring is created once at arm time and split into a [`RingProducer`]
//! (moved into the real-time callback) and a [`RingConsumer`] (moved into
//! the disk writer thread). Neither half is `Clone`, so exactly one thread
//! ever advances each index.
//!
//! Storage and index publication come from `ringbuf`: the producer releases
//! its write index after copying and the consumer acquires it before reading,
//! and the same holds the other way round for the read index.
//! `read_space() + write_space() == capacity` on either half.

use std::sync::Arc;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Fixed-capacity byte ring, before it is split between threads.
pub struct RingBuffer {
    rb: Arc<HeapRb<u8>>,
}

impl RingBuffer {
    /// Allocate a ring of `capacity` bytes.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            rb: Arc::new(HeapRb::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.rb.capacity().get()
    }

    /// A read-only view of the fill level, usable from any thread.
    pub fn monitor(&self) -> RingMonitor {
        RingMonitor {
            rb: Arc::clone(&self.rb),
        }
    }

    /// Split into the two thread-owned halves.
    pub fn split(self) -> (RingProducer, RingConsumer) {
        let (prod, cons) = self.rb.split();
        (RingProducer { prod }, RingConsumer { cons })
    }
}

/// Writing half. Lives on the real-time thread.
pub struct RingProducer {
    prod: HeapProd<u8>,
}

impl RingProducer {
    /// Copy as much of `bytes` as fits. Returns the number of bytes written.
    ///
    /// Never blocks and never allocates. A return value shorter than
    /// `bytes.len()` means the ring was too full; the caller decides whether
    /// that counts as an overrun.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        self.prod.push_slice(bytes)
    }

    pub fn write_space(&self) -> usize {
        self.prod.vacant_len()
    }

    pub fn read_space(&self) -> usize {
        self.prod.occupied_len()
    }

    pub fn capacity(&self) -> usize {
        self.prod.capacity().get()
    }
}

/// Reading half. Lives on the disk writer thread.
pub struct RingConsumer {
    cons: HeapCons<u8>,
}

impl RingConsumer {
    /// Copy up to `out.len()` available bytes into `out`. Returns the number
    /// of bytes read. Never blocks.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.cons.pop_slice(out)
    }

    pub fn read_space(&self) -> usize {
        self.cons.occupied_len()
    }

    pub fn write_space(&self) -> usize {
        self.cons.vacant_len()
    }

    pub fn capacity(&self) -> usize {
        self.cons.capacity().get()
    }
}

/// Shared, read-only view of a ring's fill level.
///
/// Both indices may move while it looks, so the figures are a snapshot that
/// is always within `0..=capacity`.
#[derive(Clone)]
pub struct RingMonitor {
    rb: Arc<HeapRb<u8>>,
}

impl RingMonitor {
    pub fn read_space(&self) -> usize {
        let capacity = self.capacity();
        // Read index first: it never passes the write index loaded after it.
        let read = self.rb.read_index();
        let write = self.rb.write_index();
        let modulus = 2 * capacity;
        ((modulus + write - read) % modulus).min(capacity)
    }

    pub fn write_space(&self) -> usize {
        self.capacity() - self.read_space()
    }

    pub fn capacity(&self) -> usize {
        self.rb.capacity().get()
    }
}
