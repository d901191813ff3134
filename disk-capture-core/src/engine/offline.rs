//! Hardware-free [`AudioEngine`].
//!
//! The engine never runs cycles on its own. An [`OfflineDriver`] does, from
//! whatever thread holds it, with caller-supplied input buffers. That makes it
//! suitable for rendering pre-recorded material through the capture pipeline
//! and for exercising sessions deterministically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::traits::audio_engine::{AudioEngine, ProcessHandler, ShutdownHandler};

/// Setup step an [`OfflineEngine`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFault {
    OpenClient,
    Activate,
    RegisterPort,
    Connect,
}

#[derive(Default)]
struct ClientState {
    name: Option<String>,
    ports: Vec<String>,
    connections: Vec<(String, String)>,
    closed: bool,
}

struct EngineShared {
    sample_rate: u32,
    physical_ports: Vec<String>,
    fault: Option<EngineFault>,
    handler: Mutex<Option<Box<dyn ProcessHandler>>>,
    shutdown: Mutex<Option<ShutdownHandler>>,
    client: Mutex<ClientState>,
    active: AtomicBool,
    cycles: AtomicU64,
}

pub struct OfflineEngine {
    shared: Arc<EngineShared>,
}

impl OfflineEngine {
    /// An engine at `sample_rate` exposing `physical_ports` capture ports
    /// named `system:capture_1..=N`.
    pub fn new(sample_rate: u32, physical_ports: usize) -> Self {
        let ports = (1..=physical_ports).map(|i| format!("system:capture_{}", i)).collect();
        Self::with_ports(sample_rate, ports)
    }

    pub fn with_ports(sample_rate: u32, physical_ports: Vec<String>) -> Self {
        Self::build(sample_rate, physical_ports, None)
    }

    /// Same engine, but the given setup step returns an error.
    pub fn with_fault(self, fault: EngineFault) -> Self {
        Self::build(self.shared.sample_rate, self.shared.physical_ports.clone(), Some(fault))
    }

    fn build(sample_rate: u32, physical_ports: Vec<String>, fault: Option<EngineFault>) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                sample_rate,
                physical_ports,
                fault,
                handler: Mutex::new(None),
                shutdown: Mutex::new(None),
                client: Mutex::new(ClientState::default()),
                active: AtomicBool::new(false),
                cycles: AtomicU64::new(0),
            }),
        }
    }

    /// Handle for running cycles and inspecting the graph.
    pub fn driver(&self) -> OfflineDriver {
        OfflineDriver {
            shared: Arc::clone(&self.shared),
        }
    }

    fn check_fault(&self, step: EngineFault, detail: &str) -> Result<(), CaptureError> {
        if self.shared.fault != Some(step) {
            return Ok(());
        }
        Err(match step {
            EngineFault::OpenClient | EngineFault::Activate => {
                CaptureError::EngineUnavailable(format!("{} refused", detail))
            }
            EngineFault::RegisterPort => CaptureError::PortRegistration(detail.to_string()),
            EngineFault::Connect => CaptureError::PortConnection {
                source_port: detail.to_string(),
                destination_port: String::new(),
                reason: "refused".into(),
            },
        })
    }

    fn require_open(&self) -> Result<(), CaptureError> {
        let client = self.shared.client.lock();
        if client.name.is_some() && !client.closed {
            Ok(())
        } else {
            Err(CaptureError::EngineUnavailable("client is not open".into()))
        }
    }
}

impl AudioEngine for OfflineEngine {
    fn open_client(&mut self, client_name: &str) -> Result<(), CaptureError> {
        self.check_fault(EngineFault::OpenClient, "client open")?;
        let mut client = self.shared.client.lock();
        if client.name.is_some() {
            return Err(CaptureError::EngineUnavailable("client already open".into()));
        }
        client.name = Some(client_name.to_string());
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.shared.sample_rate
    }

    fn physical_capture_ports(&self) -> Result<Vec<String>, CaptureError> {
        self.require_open()?;
        Ok(self.shared.physical_ports.clone())
    }

    fn set_process_handler(
        &mut self,
        handler: Box<dyn ProcessHandler>,
    ) -> Result<(), CaptureError> {
        self.require_open()?;
        if self.shared.active.load(Ordering::Acquire) {
            return Err(CaptureError::EngineUnavailable(
                "process handler must be set before activation".into(),
            ));
        }
        *self.shared.handler.lock() = Some(handler);
        Ok(())
    }

    fn set_shutdown_handler(&mut self, handler: ShutdownHandler) -> Result<(), CaptureError> {
        self.require_open()?;
        *self.shared.shutdown.lock() = Some(handler);
        Ok(())
    }

    fn activate(&mut self) -> Result<(), CaptureError> {
        self.require_open()?;
        self.check_fault(EngineFault::Activate, "activation")?;
        self.shared.active.store(true, Ordering::Release);
        Ok(())
    }

    fn register_input_port(&mut self, short_name: &str) -> Result<String, CaptureError> {
        self.require_open()?;
        self.check_fault(EngineFault::RegisterPort, short_name)?;
        let mut client = self.shared.client.lock();
        let full_name = format!("{}:{}", client.name.as_deref().unwrap_or_default(), short_name);
        if client.ports.contains(&full_name) {
            return Err(CaptureError::PortRegistration(format!("{} already registered", full_name)));
        }
        client.ports.push(full_name.clone());
        Ok(full_name)
    }

    fn connect(&mut self, source: &str, destination: &str) -> Result<(), CaptureError> {
        self.require_open()?;
        self.check_fault(EngineFault::Connect, source)?;
        if !self.shared.physical_ports.iter().any(|p| p == source) {
            return Err(CaptureError::PortConnection {
                source_port: source.to_string(),
                destination_port: destination.to_string(),
                reason: "no such port".into(),
            });
        }
        let mut client = self.shared.client.lock();
        if !client.ports.iter().any(|p| p == destination) {
            return Err(CaptureError::PortConnection {
                source_port: source.to_string(),
                destination_port: destination.to_string(),
                reason: "destination not registered".into(),
            });
        }
        client.connections.push((source.to_string(), destination.to_string()));
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.shared.active.store(false, Ordering::Release);
        // Dropping the handler releases its half of the ring.
        *self.shared.handler.lock() = None;
        *self.shared.shutdown.lock() = None;
        self.shared.client.lock().closed = true;
        Ok(())
    }
}

/// Runs cycles on an [`OfflineEngine`] from the calling thread.
#[derive(Clone)]
pub struct OfflineDriver {
    shared: Arc<EngineShared>,
}

impl OfflineDriver {
    /// Run one cycle over per-port input buffers. Returns false, without
    /// calling the handler, if the engine is not active.
    pub fn run_cycle(&self, inputs: &[&[f32]], nframes: usize) -> bool {
        if !self.shared.active.load(Ordering::Acquire) {
            return false;
        }
        let mut handler = self.shared.handler.lock();
        let Some(handler) = handler.as_mut() else {
            return false;
        };
        handler.process(inputs, nframes);
        self.shared.cycles.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Split interleaved `samples` into cycles of `period` frames and run them.
    /// Returns the number of frames delivered.
    pub fn feed_interleaved(&self, samples: &[f32], channels: usize, period: usize) -> usize {
        if channels == 0 || period == 0 {
            return 0;
        }
        let mut buffers: Vec<Vec<f32>> = vec![Vec::with_capacity(period); channels];
        let mut delivered = 0;
        for cycle in samples.chunks(period * channels) {
            let frames = cycle.len() / channels;
            for (channel, buffer) in buffers.iter_mut().enumerate() {
                buffer.clear();
                buffer.extend(cycle.iter().skip(channel).step_by(channels).take(frames));
            }
            let inputs: Vec<&[f32]> = buffers.iter().map(Vec::as_slice).collect();
            if !self.run_cycle(&inputs, frames) {
                break;
            }
            delivered += frames;
        }
        delivered
    }

    /// Fire the engine-shutdown notification, as a server going away would.
    pub fn trigger_shutdown(&self) {
        self.shared.active.store(false, Ordering::Release);
        let handler = self.shared.shutdown.lock().take();
        if let Some(handler) = handler {
            handler();
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    pub fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }

    pub fn client_name(&self) -> Option<String> {
        self.shared.client.lock().name.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.client.lock().closed
    }

    pub fn registered_ports(&self) -> Vec<String> {
        self.shared.client.lock().ports.clone()
    }

    pub fn connections(&self) -> Vec<(String, String)> {
        self.shared.client.lock().connections.clone()
    }

    pub fn has_process_handler(&self) -> bool {
        self.shared.handler.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Arc<Mutex<Vec<(usize, usize)>>>);

    impl ProcessHandler for Recorder {
        fn process(&mut self, inputs: &[&[f32]], nframes: usize) {
            self.0.lock().push((inputs.len(), nframes));
        }
    }

    #[test]
    fn cycles_only_run_when_active() {
        let mut engine = OfflineEngine::new(48000, 2);
        let driver = engine.driver();
        let calls = Arc::new(Mutex::new(Vec::new()));

        engine.open_client("test").unwrap();
        engine.set_process_handler(Box::new(Recorder(Arc::clone(&calls)))).unwrap();
        assert!(!driver.run_cycle(&[], 0));

        engine.activate().unwrap();
        assert!(driver.run_cycle(&[&[0.0; 4][..]], 4));
        assert_eq!(*calls.lock(), vec![(1, 4)]);
        assert_eq!(driver.cycles(), 1);
    }

    #[test]
    fn feed_splits_into_periods() {
        let mut engine = OfflineEngine::new(48000, 2);
        let driver = engine.driver();
        let calls = Arc::new(Mutex::new(Vec::new()));
        engine.open_client("test").unwrap();
        engine.set_process_handler(Box::new(Recorder(Arc::clone(&calls)))).unwrap();
        engine.activate().unwrap();

        let samples = vec![0.0f32; 2 * 10];
        assert_eq!(driver.feed_interleaved(&samples, 2, 4), 10);
        assert_eq!(*calls.lock(), vec![(2, 4), (2, 4), (2, 2)]);
    }

    #[test]
    fn connect_validates_both_ends() {
        let mut engine = OfflineEngine::new(44100, 1);
        engine.open_client("rec").unwrap();
        let port = engine.register_input_port("input1").unwrap();
        assert_eq!(port, "rec:input1");

        assert!(engine.connect("system:capture_1", &port).is_ok());
        assert!(engine.connect("system:capture_9", &port).is_err());
        assert!(engine.connect("system:capture_1", "rec:input2").is_err());
        assert_eq!(
            engine.driver().connections(),
            vec![("system:capture_1".to_string(), "rec:input1".to_string())]
        );
    }

    #[test]
    fn closed_client_refuses_calls() {
        let mut engine = OfflineEngine::new(48000, 1);
        assert!(engine.physical_capture_ports().is_err());
        engine.open_client("rec").unwrap();
        engine.close().unwrap();
        assert!(engine.activate().is_err());
        assert!(engine.driver().is_closed());
    }

    #[test]
    fn injected_fault_fails_its_step() {
        let mut engine = OfflineEngine::new(48000, 1).with_fault(EngineFault::RegisterPort);
        engine.open_client("rec").unwrap();
        assert!(matches!(
            engine.register_input_port("input1"),
            Err(CaptureError::PortRegistration(_))
        ));
    }

    #[test]
    fn shutdown_notification_fires_once() {
        let mut engine = OfflineEngine::new(48000, 1);
        let driver = engine.driver();
        let fired = Arc::new(AtomicU64::new(0));
        engine.open_client("rec").unwrap();
        {
            let fired = Arc::clone(&fired);
            engine
                .set_shutdown_handler(Box::new(move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        engine.activate().unwrap();

        driver.trigger_shutdown();
        driver.trigger_shutdown();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!driver.is_active());
    }
}
