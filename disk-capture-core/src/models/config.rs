use std::path::PathBuf;

/// Sample-unit width in bytes. Samples travel through the ring as native-endian `f32`.
pub const SAMPLE_UNIT_BYTES: usize = std::mem::size_of::<f32>();

/// Configuration for a capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfiguration {
    /// Name the session registers with the audio engine (default: "disk_capture").
    pub client_name: String,

    /// Number of channels to record when `source_ports` is empty (default: 2).
    /// The first `channels` physical capture ports are used.
    pub channels: u16,

    /// Explicit source ports to record from. When non-empty, the channel
    /// count is the number of ports listed here.
    pub source_ports: Vec<String>,

    /// Ring-buffer capacity in frames (default: 16384).
    pub buffer_frames: usize,

    /// Output file path.
    pub output_path: PathBuf,

    /// Capture duration in seconds.
    pub duration_secs: f64,

    /// Bit depth of the output file (default: 16). Valid values: 16, 24, 32.
    pub bit_depth: u16,

    /// Write a `<output>.report.json` sidecar when the session closes.
    pub write_report_sidecar: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.client_name.is_empty() {
            return Err("client name must not be empty".into());
        }
        if self.source_ports.is_empty() && self.channels == 0 {
            return Err("channel count must be at least 1".into());
        }
        if self.buffer_frames == 0 {
            return Err("ring buffer must hold at least one frame".into());
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(format!("invalid capture duration: {}", self.duration_secs));
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("output path must not be empty".into());
        }
        Ok(())
    }

    /// Target frame count for a negotiated sample rate.
    ///
    /// Rounded up so the written file is never shorter than requested.
    pub fn target_frames(&self, sample_rate: u32) -> u64 {
        (self.duration_secs * f64::from(sample_rate)).ceil() as u64
    }

    /// Ring capacity in bytes for a given channel count.
    pub fn ring_capacity_bytes(&self, channels: usize) -> usize {
        channels * SAMPLE_UNIT_BYTES * self.buffer_frames
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            client_name: "disk_capture".into(),
            channels: 2,
            source_ports: Vec::new(),
            buffer_frames: 16384,
            output_path: PathBuf::from("capture.wav"),
            duration_secs: 1.0,
            bit_depth: 16,
            write_report_sidecar: false,
        }
    }
}
