use std::sync::Arc;
use std::thread;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::report::{CaptureOutcome, CaptureReport};
use crate::models::state::{CaptureStatus, SessionState};
use crate::processing::ring_buffer::{RingBuffer, RingMonitor};
use crate::processing::sample_format::SampleEncoding;
use crate::session::capture_callback::CaptureCallback;
use crate::session::context::{CaptureContext, CaptureProgress};
use crate::session::disk_writer::{DiskWriter, DiskWriterOutcome, WriterExit};
use crate::storage::report_sidecar;
use crate::storage::wav_writer::WavSinkOpener;
use crate::traits::audio_engine::{AudioEngine, ShutdownHandler};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_sink::{SinkOpener, SinkSpec};

/// Orchestrates one capture session against an audio engine.
///
/// Data flow:
/// ```text
/// [engine RT thread] → CaptureCallback → [RingBuffer] → DiskWriter thread → [FrameSink]
/// ```
///
/// Setup runs `configure → arm → start`, after which [`wait`](Self::wait)
/// joins the disk writer and closes everything down. Any setup failure tears
/// the session down and leaves it `Closed`.
pub struct CaptureSessionController<E: AudioEngine> {
    engine: E,
    config: CaptureConfiguration,
    state: SessionState,
    sink_opener: Box<dyn SinkOpener>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    shutdown_hook: Option<ShutdownHandler>,
    client_open: bool,

    // Negotiated during configure
    source_ports: Vec<String>,
    sample_rate: u32,
    channels: u16,
    encoding: SampleEncoding,

    // Live from arm until close
    context: Option<Arc<CaptureContext>>,
    ring_monitor: Option<RingMonitor>,
    writer_handle: Option<thread::JoinHandle<DiskWriterOutcome>>,
}

impl<E: AudioEngine> CaptureSessionController<E> {
    /// New session writing WAV files.
    pub fn new(engine: E, config: CaptureConfiguration) -> Self {
        Self {
            engine,
            config,
            state: SessionState::Uninitialized,
            sink_opener: Box::new(WavSinkOpener),
            delegate: None,
            shutdown_hook: None,
            client_open: false,
            source_ports: Vec::new(),
            sample_rate: 0,
            channels: 0,
            encoding: SampleEncoding::Pcm16,
            context: None,
            ring_monitor: None,
            writer_handle: None,
        }
    }

    /// Replace the sink the session writes to.
    pub fn with_sink_opener(mut self, opener: impl SinkOpener + 'static) -> Self {
        self.sink_opener = Box::new(opener);
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Replace what happens when the engine shuts down underneath the session.
    /// The default logs and exits the process without flushing.
    pub fn set_shutdown_hook(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.shutdown_hook = Some(Box::new(hook));
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Source ports selected during configure.
    pub fn source_ports(&self) -> &[String] {
        &self.source_ports
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Live progress, available from arm until the session closes.
    pub fn progress(&self) -> Option<CaptureProgress> {
        match (&self.context, &self.ring_monitor) {
            (Some(context), Some(ring)) => {
                Some(CaptureProgress::new(Arc::clone(context), ring.clone()))
            }
            _ => None,
        }
    }

    /// Run the whole session: configure, arm, start, then wait for the writer.
    pub fn run(&mut self) -> Result<CaptureReport, CaptureError> {
        self.configure()?;
        self.arm()?;
        self.start()?;
        self.wait()
    }

    /// Open the engine client and choose the ports to record.
    /// Transitions: uninitialized → configured.
    pub fn configure(&mut self) -> Result<(), CaptureError> {
        self.expect_state(SessionState::Uninitialized)?;
        if let Err(reason) = self.config.validate() {
            return Err(self.abort(CaptureError::ConfigurationFailed(reason)));
        }

        if let Err(e) = self.engine.open_client(&self.config.client_name) {
            return Err(self.abort(e));
        }
        self.client_open = true;

        match self.negotiate() {
            Ok(()) => {
                log::info!(
                    "configured {} channel(s) at {} Hz from [{}]",
                    self.channels,
                    self.sample_rate,
                    self.source_ports.join(", ")
                );
                self.set_state(SessionState::Configured);
                Ok(())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn negotiate(&mut self) -> Result<(), CaptureError> {
        self.sample_rate = self.engine.sample_rate();
        if self.sample_rate == 0 {
            return Err(CaptureError::EngineUnavailable("engine reports a 0 Hz sample rate".into()));
        }

        self.source_ports = if self.config.source_ports.is_empty() {
            let wanted = self.config.channels as usize;
            let available = self.engine.physical_capture_ports()?;
            log::debug!("physical capture ports: {:?}", available);
            if available.len() < wanted {
                return Err(CaptureError::ConfigurationFailed(format!(
                    "{} channel(s) requested but only {} physical capture port(s) found",
                    wanted,
                    available.len()
                )));
            }
            available.into_iter().take(wanted).collect()
        } else {
            self.config.source_ports.clone()
        };

        self.channels = u16::try_from(self.source_ports.len())
            .map_err(|_| CaptureError::ConfigurationFailed("too many source ports".into()))?;
        let bit_depth = self.config.bit_depth;
        self.encoding = SampleEncoding::from_bit_depth(bit_depth).ok_or_else(|| {
            CaptureError::ConfigurationFailed(format!("unsupported bit depth: {}", bit_depth))
        })?;
        Ok(())
    }

    /// Allocate the ring, open the sink, start the disk writer and register
    /// the callbacks. Transitions: configured → armed.
    pub fn arm(&mut self) -> Result<(), CaptureError> {
        self.expect_state(SessionState::Configured)?;
        match self.arm_inner() {
            Ok(()) => {
                self.set_state(SessionState::Armed);
                Ok(())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn arm_inner(&mut self) -> Result<(), CaptureError> {
        let channels = self.channels as usize;
        let target_frames = self.config.target_frames(self.sample_rate);
        let context = Arc::new(CaptureContext::new(channels, target_frames));

        let ring = RingBuffer::new(self.config.ring_capacity_bytes(channels));
        self.ring_monitor = Some(ring.monitor());
        let (producer, consumer) = ring.split();

        let spec = SinkSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
            encoding: self.encoding,
        };
        let sink = self.sink_opener.open(&self.config.output_path, &spec)?;

        self.context = Some(Arc::clone(&context));
        self.writer_handle = Some(DiskWriter::new(Arc::clone(&context), consumer, sink).spawn()?);

        self.engine
            .set_process_handler(Box::new(CaptureCallback::new(Arc::clone(&context), producer)))?;
        let hook = self.shutdown_hook.take().unwrap_or_else(default_shutdown_hook);
        self.engine.set_shutdown_handler(hook)?;

        context.set_status(CaptureStatus::Armed);
        log::info!(
            "armed: {} frames target, ring of {} frames, writing {}",
            target_frames,
            self.config.buffer_frames,
            self.config.output_path.display()
        );
        Ok(())
    }

    /// Activate the engine, connect the ports, and enable capture.
    /// Transitions: armed → capturing.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.expect_state(SessionState::Armed)?;
        match self.start_inner() {
            Ok(()) => {
                self.set_state(SessionState::Capturing);
                Ok(())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn start_inner(&mut self) -> Result<(), CaptureError> {
        self.engine.activate()?;

        for (index, source) in self.source_ports.iter().enumerate() {
            let destination = self.engine.register_input_port(&format!("input{}", index + 1))?;
            self.engine.connect(source, &destination)?;
        }

        // Only enable the callback once every connection is in place.
        if let Some(context) = &self.context {
            context.set_status(CaptureStatus::Active);
        }
        log::info!("capturing");
        Ok(())
    }

    /// Block until the disk writer finishes, then close the session.
    /// Transitions: capturing → closed.
    ///
    /// A sink failure during capture is not an `Err`: the report comes back
    /// with [`CaptureOutcome::SinkFailed`] and the frames written so far.
    pub fn wait(&mut self) -> Result<CaptureReport, CaptureError> {
        self.expect_state(SessionState::Capturing)?;

        let outcome = match self.writer_handle.take().map(|handle| handle.join()) {
            Some(Ok(outcome)) => outcome,
            Some(Err(_)) => {
                let err = CaptureError::StorageError("disk writer thread panicked".into());
                return Err(self.abort(err));
            }
            None => {
                let err = CaptureError::StorageError("disk writer not running".into());
                return Err(self.abort(err));
            }
        };

        self.close(outcome)
    }

    fn close(&mut self, outcome: DiskWriterOutcome) -> Result<CaptureReport, CaptureError> {
        let Some(context) = self.context.take() else {
            return Err(self.abort(CaptureError::StorageError("capture context missing".into())));
        };
        // Cycles still delivered by the engine are no-ops from here on.
        context.set_status(CaptureStatus::Closed);

        let DiskWriterOutcome {
            mut sink,
            committed_frames,
            exit,
        } = outcome;

        let mut report = CaptureReport::new(
            self.config.output_path.clone(),
            self.sample_rate,
            self.channels,
            self.config.bit_depth,
            context.target_frames(),
        );
        report.frames_committed = committed_frames;
        report.captured_secs = committed_frames as f64 / f64::from(self.sample_rate);

        let close_result = sink.close();
        drop(sink);

        report.overruns = context.overruns();
        if report.has_overruns() {
            log::warn!(
                "{} sample overruns; increase the ring buffer beyond {} frames",
                report.overruns,
                self.config.buffer_frames
            );
        }

        // Release the ring before closing the client.
        drop(context);
        self.ring_monitor = None;
        let engine_result = self.close_engine();

        match exit {
            WriterExit::Completed => {}
            WriterExit::SinkFailed(err) => {
                self.notify_error(&err);
                report.outcome = CaptureOutcome::SinkFailed(err.to_string());
            }
            WriterExit::Stopped => {
                report.outcome = CaptureOutcome::SinkFailed("capture stopped before target".into());
            }
        }

        match close_result {
            Ok(checksum) => report.checksum = checksum,
            Err(err) => {
                self.notify_error(&err);
                if report.is_success() {
                    report.outcome = CaptureOutcome::SinkFailed(err.to_string());
                }
            }
        }

        if self.config.write_report_sidecar {
            // The recording is already final; a missing sidecar only loses
            // the JSON copy of the report.
            if let Err(err) = report_sidecar::write_report(&report, &self.config.output_path) {
                log::warn!("report sidecar not written: {}", err);
                self.notify_error(&err);
            }
        }

        self.set_state(SessionState::Closed);
        if report.is_success() {
            log::info!("{}", report);
        } else {
            log::error!("{}", report);
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&report);
        }

        engine_result.map(|()| report)
    }

    // --- Internal helpers ---

    fn expect_state(&self, expected: SessionState) -> Result<(), CaptureError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CaptureError::InvalidState {
                expected: expected.name(),
                found: self.state.name(),
            })
        }
    }

    fn set_state(&mut self, new_state: SessionState) {
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(new_state);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }

    fn close_engine(&mut self) -> Result<(), CaptureError> {
        if !self.client_open {
            return Ok(());
        }
        self.client_open = false;
        self.engine.close()
    }

    /// Tear down whatever setup got as far as building, then report `error`.
    fn abort(&mut self, error: CaptureError) -> CaptureError {
        log::error!("capture session failed: {}", error);
        self.teardown();
        self.set_state(SessionState::Closed);
        self.notify_error(&error);
        error
    }

    /// Stop the disk writer, finalize the sink and close the engine client.
    fn teardown(&mut self) {
        if let Some(context) = self.context.take() {
            context.set_status(CaptureStatus::Closed);
            if let Some(handle) = self.writer_handle.take() {
                // The writer may be between its status check and its wait;
                // signal until it notices.
                while !handle.is_finished() {
                    context.handoff().try_notify();
                    thread::yield_now();
                }
                if let Ok(mut outcome) = handle.join() {
                    if let Err(e) = outcome.sink.close() {
                        log::warn!("failed to close sink during teardown: {}", e);
                    }
                }
            }
        }
        self.ring_monitor = None;

        if let Err(e) = self.close_engine() {
            log::warn!("failed to close engine client during teardown: {}", e);
        }
    }
}

impl<E: AudioEngine> Drop for CaptureSessionController<E> {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Uninitialized | SessionState::Closed) {
            return;
        }
        log::warn!("capture session dropped while {}; closing it", self.state.name());
        self.teardown();
        self.set_state(SessionState::Closed);
    }
}

fn default_shutdown_hook() -> ShutdownHandler {
    Box::new(|| {
        log::error!("audio engine shut down; exiting without flushing the recording");
        std::process::exit(1);
    })
}
