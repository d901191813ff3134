use crate::models::error::CaptureError;

/// Per-cycle audio callback, invoked synchronously on the engine's real-time thread.
///
/// `inputs` holds one buffer per input port registered by this client, in
/// registration order; each buffer holds at least `nframes` samples.
/// Implementations must not allocate, block, or perform I/O.
pub trait ProcessHandler: Send {
    fn process(&mut self, inputs: &[&[f32]], nframes: usize);
}

/// Called once if the engine shuts down underneath the client.
pub type ShutdownHandler = Box<dyn FnOnce() + Send + 'static>;

/// Binding to an audio graph engine (a JACK-style server).
///
/// The session controller drives it in this order: `open_client`, port
/// discovery, `set_process_handler`, `set_shutdown_handler`, `activate`,
/// `register_input_port` / `connect`, and finally `close`.
pub trait AudioEngine: Send {
    /// Open a client connection to the engine.
    fn open_client(&mut self, client_name: &str) -> Result<(), CaptureError>;

    /// Sample rate the engine runs at. Valid once the client is open.
    fn sample_rate(&self) -> u32;

    /// Physical capture ports (hardware outputs into the graph), in engine order.
    fn physical_capture_ports(&self) -> Result<Vec<String>, CaptureError>;

    /// Install the real-time process callback. Must be called before `activate`.
    fn set_process_handler(&mut self, handler: Box<dyn ProcessHandler>) -> Result<(), CaptureError>;

    /// Install the engine-shutdown notification.
    fn set_shutdown_handler(&mut self, handler: ShutdownHandler) -> Result<(), CaptureError>;

    /// Start calling the process handler.
    fn activate(&mut self) -> Result<(), CaptureError>;

    /// Register an input port owned by this client; returns its full name.
    fn register_input_port(&mut self, short_name: &str) -> Result<String, CaptureError>;

    /// Connect `source` to `destination`.
    fn connect(&mut self, source: &str, destination: &str) -> Result<(), CaptureError>;

    /// Deactivate and close the client.
    fn close(&mut self) -> Result<(), CaptureError>;
}
