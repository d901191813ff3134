//! Consumer side of the pipeline: drains whole frames from the ring into the sink.

use std::sync::Arc;
use std::thread;

use crate::models::error::CaptureError;
use crate::models::state::CaptureStatus;
use crate::processing::ring_buffer::RingConsumer;
use crate::processing::sample_format::decode_units;
use crate::session::context::CaptureContext;
use crate::traits::frame_sink::FrameSink;

/// Why the disk writer stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterExit {
    /// Committed frames reached the target.
    Completed,
    /// A sink write failed or came up short. Carries a `SinkWrite` error.
    SinkFailed(CaptureError),
    /// The session was closed before the target was reached.
    Stopped,
}

/// What the disk writer thread hands back when joined.
pub struct DiskWriterOutcome {
    /// The sink, still open; the controller closes it.
    pub sink: Box<dyn FrameSink>,
    pub committed_frames: u64,
    pub exit: WriterExit,
}

pub struct DiskWriter {
    context: Arc<CaptureContext>,
    consumer: RingConsumer,
    sink: Box<dyn FrameSink>,
    frame_bytes: Vec<u8>,
    frame_samples: Vec<f32>,
    committed_frames: u64,
}

impl DiskWriter {
    pub fn new(
        context: Arc<CaptureContext>,
        consumer: RingConsumer,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        let bytes_per_frame = context.bytes_per_frame();
        let channels = context.channels();
        Self {
            context,
            consumer,
            sink,
            frame_bytes: vec![0u8; bytes_per_frame],
            frame_samples: Vec::with_capacity(channels),
            committed_frames: 0,
        }
    }

    /// Start the writer on its own thread. It waits for the first signal
    /// until the session becomes active.
    pub fn spawn(self) -> Result<thread::JoinHandle<DiskWriterOutcome>, CaptureError> {
        thread::Builder::new()
            .name("disk-writer".into())
            .spawn(move || self.run())
            .map_err(|e| CaptureError::ThreadSpawn(format!("disk writer: {}", e)))
    }

    /// Drain loop. Holds the handoff lock except while waiting.
    pub fn run(mut self) -> DiskWriterOutcome {
        let context = Arc::clone(&self.context);
        let bytes_per_frame = context.bytes_per_frame();
        let target = context.target_frames();

        let mut drain = context.handoff().lock();
        let exit = 'session: loop {
            if self.committed_frames >= target {
                break WriterExit::Completed;
            }
            while context.is_active() && self.consumer.read_space() >= bytes_per_frame {
                if let Err(err) = self.write_one_frame() {
                    break 'session WriterExit::SinkFailed(err);
                }
                if self.committed_frames >= target {
                    break 'session WriterExit::Completed;
                }
            }
            if context.status() == CaptureStatus::Closed {
                break WriterExit::Stopped;
            }
            drain.wait();
        };
        drop(drain);

        match &exit {
            WriterExit::Completed => {
                log::debug!("disk writer reached {} frames", self.committed_frames)
            }
            WriterExit::SinkFailed(err) => log::error!("disk writer stopped: {}", err),
            WriterExit::Stopped => {
                log::debug!("disk writer stopped early at {} frames", self.committed_frames)
            }
        }
        context.mark_writer_finished();

        DiskWriterOutcome {
            sink: self.sink,
            committed_frames: self.committed_frames,
            exit,
        }
    }

    /// Dequeue exactly one frame and hand it to the sink as one frame.
    fn write_one_frame(&mut self) -> Result<(), CaptureError> {
        let read = self.consumer.read(&mut self.frame_bytes);
        debug_assert_eq!(read, self.frame_bytes.len());
        decode_units(&self.frame_bytes[..read], &mut self.frame_samples);

        let committed_frames = self.committed_frames;
        let written = self
            .sink
            .write_frames(&self.frame_samples, 1)
            .map_err(|e| CaptureError::SinkWrite {
                committed_frames,
                reason: e.to_string(),
            })?;
        if written < 1 {
            return Err(CaptureError::SinkWrite {
                committed_frames: self.committed_frames,
                reason: "sink accepted 0 of 1 frames".into(),
            });
        }

        self.committed_frames += 1;
        self.context.set_committed_frames(self.committed_frames);
        Ok(())
    }
}
