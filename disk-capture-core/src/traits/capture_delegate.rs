use crate::models::error::CaptureError;
use crate::models::report::CaptureReport;
use crate::models::state::SessionState;

/// Event delegate for capture session notifications.
///
/// Called from the thread driving the session controller, never from the
/// real-time thread.
pub trait CaptureDelegate: Send + Sync {
    /// Called after every state transition.
    fn on_state_changed(&self, state: SessionState);

    /// Called when the session hits a fatal error.
    fn on_error(&self, error: &CaptureError);

    /// Called once the sink is closed and the report is final.
    fn on_capture_finished(&self, report: &CaptureReport);
}
