//! # disk-capture-core
//!
//! Real-time audio capture to disk.
//!
//! An audio engine calls [`CaptureCallback`] once per cycle on its real-time
//! thread. The callback copies samples into a lock-free [`RingBuffer`] and
//! wakes the [`DiskWriter`] thread, which drains whole frames into a
//! [`FrameSink`] until the requested duration has been written.
//! [`CaptureSessionController`] wires it together and produces a
//! [`CaptureReport`].
//!
//! ## Architecture
//!
//! ```text
//! disk-capture-core (this crate)
//! ├── traits/       ← AudioEngine, ProcessHandler, FrameSink, SinkOpener, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureConfiguration, SessionState, CaptureReport
//! ├── processing/   ← RingBuffer, Handoff, sample encodings, WAV header layout
//! ├── session/      ← CaptureCallback, DiskWriter, CaptureSessionController
//! ├── storage/      ← WavFileSink, MemorySink, JSON report sidecar
//! └── engine/       ← OfflineEngine (hardware-free engine binding)
//! ```

pub mod engine;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use engine::offline::{EngineFault, OfflineDriver, OfflineEngine};
pub use models::config::{CaptureConfiguration, SAMPLE_UNIT_BYTES};
pub use models::error::CaptureError;
pub use models::report::{CaptureOutcome, CaptureReport};
pub use models::state::{CaptureStatus, SessionState};
pub use processing::handoff::Handoff;
pub use processing::ring_buffer::{RingBuffer, RingConsumer, RingMonitor, RingProducer};
pub use processing::sample_format::SampleEncoding;
pub use session::capture_callback::{capture_cycle, CaptureCallback};
pub use session::context::{CaptureContext, CaptureProgress};
pub use session::controller::CaptureSessionController;
pub use session::disk_writer::{DiskWriter, DiskWriterOutcome, WriterExit};
pub use storage::memory_sink::{MemoryRecording, MemorySink, MemorySinkOpener};
pub use storage::wav_writer::{WavFileSink, WavSinkOpener};
pub use traits::audio_engine::{AudioEngine, ProcessHandler, ShutdownHandler};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::frame_sink::{FrameSink, SinkOpener, SinkSpec};
