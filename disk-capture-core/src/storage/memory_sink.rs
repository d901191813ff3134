use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::traits::frame_sink::{FrameSink, SinkOpener, SinkSpec};

/// Captured samples shared between a [`MemorySink`] and its owner.
#[derive(Debug, Default)]
pub struct MemoryRecording {
    pub spec: Option<SinkSpec>,
    pub samples: Vec<f32>,
    pub write_calls: u64,
    pub closed: bool,
}

impl MemoryRecording {
    pub fn frames(&self) -> usize {
        match self.spec {
            Some(spec) if spec.channels > 0 => self.samples.len() / spec.channels as usize,
            _ => 0,
        }
    }

    /// Samples of one channel, de-interleaved.
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let Some(spec) = self.spec else {
            return Vec::new();
        };
        self.samples
            .iter()
            .skip(index)
            .step_by(spec.channels.max(1) as usize)
            .copied()
            .collect()
    }
}

/// Sink that keeps interleaved samples in memory.
///
/// Useful for embedding the capture pipeline in a larger process and for
/// exercising sessions without touching the filesystem.
pub struct MemorySink {
    channels: usize,
    recording: Arc<Mutex<MemoryRecording>>,
}

impl MemorySink {
    pub fn new(spec: SinkSpec, recording: Arc<Mutex<MemoryRecording>>) -> Self {
        recording.lock().spec = Some(spec);
        Self {
            channels: spec.channels as usize,
            recording,
        }
    }
}

impl FrameSink for MemorySink {
    fn write_frames(&mut self, samples: &[f32], frames: usize) -> Result<usize, CaptureError> {
        let wanted = frames * self.channels;
        let mut recording = self.recording.lock();
        recording.write_calls += 1;
        if recording.closed {
            return Err(CaptureError::StorageError("memory sink is closed".into()));
        }
        let available = samples.len().min(wanted) / self.channels.max(1);
        recording
            .samples
            .extend_from_slice(&samples[..available * self.channels]);
        Ok(available)
    }

    fn close(&mut self) -> Result<Option<String>, CaptureError> {
        self.recording.lock().closed = true;
        Ok(None)
    }
}

/// Opens [`MemorySink`]s that all append to the same shared recording.
#[derive(Clone, Default)]
pub struct MemorySinkOpener {
    recording: Arc<Mutex<MemoryRecording>>,
}

impl MemorySinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording(&self) -> Arc<Mutex<MemoryRecording>> {
        Arc::clone(&self.recording)
    }
}

impl SinkOpener for MemorySinkOpener {
    fn open(&mut self, _path: &Path, spec: &SinkSpec) -> Result<Box<dyn FrameSink>, CaptureError> {
        Ok(Box::new(MemorySink::new(*spec, Arc::clone(&self.recording))))
    }
}
