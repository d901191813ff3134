use thiserror::Error;

/// Errors that can occur while setting up or running a capture session.
///
/// Overruns are deliberately absent: they are counted, never raised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("audio engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("port registration failed: {0}")]
    PortRegistration(String),

    #[error("port connection failed: {source_port} -> {destination_port}: {reason}")]
    PortConnection {
        source_port: String,
        destination_port: String,
        reason: String,
    },

    #[error("failed to open sink: {0}")]
    SinkOpen(String),

    #[error("sink write failed after {committed_frames} frames: {reason}")]
    SinkWrite { committed_frames: u64, reason: String },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid session state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to spawn thread: {0}")]
    ThreadSpawn(String),
}

impl CaptureError {
    /// True for failures that happen before any sample is captured.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(_)
                | Self::PortRegistration(_)
                | Self::PortConnection { .. }
                | Self::SinkOpen(_)
                | Self::ConfigurationFailed(_)
                | Self::ThreadSpawn(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_failures_are_classified() {
        assert!(CaptureError::SinkOpen("denied".into()).is_setup_failure());
        assert!(CaptureError::PortRegistration("capture_1".into()).is_setup_failure());
        assert!(!CaptureError::SinkWrite {
            committed_frames: 99,
            reason: "disk full".into()
        }
        .is_setup_failure());
    }

    #[test]
    fn sink_write_message_includes_progress() {
        let err = CaptureError::SinkWrite {
            committed_frames: 99,
            reason: "disk full".into(),
        };
        assert_eq!(err.to_string(), "sink write failed after 99 frames: disk full");
    }
}
