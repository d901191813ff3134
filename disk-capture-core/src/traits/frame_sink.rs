use std::path::Path;

use crate::models::error::CaptureError;
use crate::processing::sample_format::SampleEncoding;

/// Stream parameters a sink is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

/// Destination for captured frames, driven from the disk writer thread.
pub trait FrameSink: Send {
    /// Write `frames` interleaved frames from `samples`
    /// (`samples.len() == frames * channels`).
    ///
    /// Returns the number of frames actually written. Anything short of
    /// `frames`, or an error, is treated by the disk writer as fatal.
    fn write_frames(&mut self, samples: &[f32], frames: usize) -> Result<usize, CaptureError>;

    /// Finalize the output. Returns a content checksum when the sink computes one.
    fn close(&mut self) -> Result<Option<String>, CaptureError>;
}

/// Opens a sink for a session. Failure aborts the session before capture.
pub trait SinkOpener: Send {
    fn open(&mut self, path: &Path, spec: &SinkSpec) -> Result<Box<dyn FrameSink>, CaptureError>;
}

impl<F> SinkOpener for F
where
    F: FnMut(&Path, &SinkSpec) -> Result<Box<dyn FrameSink>, CaptureError> + Send,
{
    fn open(&mut self, path: &Path, spec: &SinkSpec) -> Result<Box<dyn FrameSink>, CaptureError> {
        self(path, spec)
    }
}
