//! Wake-up signal from the real-time producer to the disk writer.
//!
//! The mutex guards only the wait/signal protocol, never sample data. The
//! producer never blocks on it: it try-locks once per cycle and skips the
//! signal entirely if the consumer currently holds the lock. A skipped signal
//! only happens while the consumer is awake and draining, and the next cycle
//! signals again.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex, MutexGuard};

#[derive(Default)]
pub struct Handoff {
    lock: Mutex<()>,
    data_ready: Condvar,
    signals_sent: AtomicU64,
    signals_skipped: AtomicU64,
}

impl Handoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side. Signal the consumer if the lock is free, otherwise skip.
    ///
    /// Returns whether a signal was delivered. Never blocks.
    pub fn try_notify(&self) -> bool {
        match self.lock.try_lock() {
            Some(_guard) => {
                self.data_ready.notify_one();
                self.signals_sent.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => {
                self.signals_skipped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Consumer side. Take the lock for a drain loop.
    pub fn lock(&self) -> DrainGuard<'_> {
        DrainGuard {
            guard: self.lock.lock(),
            handoff: self,
        }
    }

    pub fn signals_sent(&self) -> u64 {
        self.signals_sent.load(Ordering::Relaxed)
    }

    pub fn signals_skipped(&self) -> u64 {
        self.signals_skipped.load(Ordering::Relaxed)
    }
}

/// The consumer's hold on the handoff lock.
pub struct DrainGuard<'a> {
    guard: MutexGuard<'a, ()>,
    handoff: &'a Handoff,
}

impl DrainGuard<'_> {
    /// Release the lock until the producer signals, then reacquire it.
    ///
    /// The caller must re-check buffer state after this returns.
    pub fn wait(&mut self) {
        self.handoff.data_ready.wait(&mut self.guard);
    }
}
