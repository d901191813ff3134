use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::config::SAMPLE_UNIT_BYTES;
use crate::models::state::{AtomicCaptureStatus, CaptureStatus};
use crate::processing::handoff::Handoff;
use crate::processing::ring_buffer::RingMonitor;

/// State shared by the capture callback, the disk writer and the controller
/// for one session. Replaces any process-global capture state: every session
/// gets its own context.
pub struct CaptureContext {
    channels: usize,
    target_frames: u64,
    status: AtomicCaptureStatus,
    overruns: AtomicU64,
    committed_frames: AtomicU64,
    writer_finished: AtomicBool,
    handoff: Handoff,
}

impl CaptureContext {
    pub fn new(channels: usize, target_frames: u64) -> Self {
        Self {
            channels,
            target_frames,
            status: AtomicCaptureStatus::new(CaptureStatus::Uninitialized),
            overruns: AtomicU64::new(0),
            committed_frames: AtomicU64::new(0),
            writer_finished: AtomicBool::new(false),
            handoff: Handoff::new(),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels * SAMPLE_UNIT_BYTES
    }

    pub fn target_frames(&self) -> u64 {
        self.target_frames
    }

    pub fn status(&self) -> CaptureStatus {
        self.status.load()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn set_status(&self, status: CaptureStatus) {
        self.status.store(status);
    }

    /// Sample units dropped so far because the ring was full.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub(crate) fn add_overruns(&self, units: u64) {
        self.overruns.fetch_add(units, Ordering::Relaxed);
    }

    /// Frames the disk writer has handed to the sink successfully.
    pub fn committed_frames(&self) -> u64 {
        self.committed_frames.load(Ordering::Acquire)
    }

    pub(crate) fn set_committed_frames(&self, frames: u64) {
        self.committed_frames.store(frames, Ordering::Release);
    }

    pub fn writer_finished(&self) -> bool {
        self.writer_finished.load(Ordering::Acquire)
    }

    pub(crate) fn mark_writer_finished(&self) {
        self.writer_finished.store(true, Ordering::Release);
    }

    pub fn handoff(&self) -> &Handoff {
        &self.handoff
    }
}

/// Cloneable, read-only view of a running session.
#[derive(Clone)]
pub struct CaptureProgress {
    context: Arc<CaptureContext>,
    ring: RingMonitor,
}

impl CaptureProgress {
    pub(crate) fn new(context: Arc<CaptureContext>, ring: RingMonitor) -> Self {
        Self { context, ring }
    }

    pub fn committed_frames(&self) -> u64 {
        self.context.committed_frames()
    }

    pub fn target_frames(&self) -> u64 {
        self.context.target_frames()
    }

    pub fn overruns(&self) -> u64 {
        self.context.overruns()
    }

    pub fn status(&self) -> CaptureStatus {
        self.context.status()
    }

    /// True once the disk writer thread has stopped, for any reason.
    pub fn is_finished(&self) -> bool {
        self.context.writer_finished()
    }

    /// Whole frames currently waiting in the ring.
    pub fn buffered_frames(&self) -> usize {
        self.ring.read_space() / self.context.bytes_per_frame()
    }

    pub fn buffer_capacity_frames(&self) -> usize {
        self.ring.capacity() / self.context.bytes_per_frame()
    }
}
