use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the disk writer thread ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// The committed frame count reached the target.
    Completed,
    /// A sink write failed; frames written before it remain on disk.
    SinkFailed(String),
}

/// End-of-session summary handed to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureReport {
    pub id: String,
    pub output_path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub target_frames: u64,
    pub frames_committed: u64,
    /// Sample units dropped because the ring buffer was full.
    pub overruns: u64,
    pub captured_secs: f64,
    pub checksum: Option<String>,
    pub outcome: CaptureOutcome,
    pub created_at: String,
}

impl CaptureReport {
    pub(crate) fn new(
        output_path: PathBuf,
        sample_rate: u32,
        channels: u16,
        bit_depth: u16,
        target_frames: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            output_path,
            sample_rate,
            channels,
            bit_depth,
            target_frames,
            frames_committed: 0,
            overruns: 0,
            captured_secs: 0.0,
            checksum: None,
            outcome: CaptureOutcome::Completed,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == CaptureOutcome::Completed
    }

    pub fn has_overruns(&self) -> bool {
        self.overruns > 0
    }
}

impl fmt::Display for CaptureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "captured {}/{} frames ({:.3}s, {} ch @ {} Hz) to {}",
            self.frames_committed,
            self.target_frames,
            self.captured_secs,
            self.channels,
            self.sample_rate,
            self.output_path.display()
        )?;
        if let CaptureOutcome::SinkFailed(reason) = &self.outcome {
            write!(f, "; capture aborted: {}", reason)?;
        }
        if self.has_overruns() {
            write!(
                f,
                "; {} sample overruns, try a bigger buffer than the configured ring capacity",
                self.overruns
            )?;
        }
        Ok(())
    }
}
