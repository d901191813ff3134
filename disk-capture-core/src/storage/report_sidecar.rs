use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::report::CaptureReport;

/// Path of the JSON report written next to a recording: `{recording}.report.json`.
pub fn sidecar_path(recording_path: &Path) -> PathBuf {
    let mut name = recording_path.as_os_str().to_owned();
    name.push(".report.json");
    PathBuf::from(name)
}

/// Write the session report as a JSON sidecar file.
pub fn write_report(
    report: &CaptureReport,
    recording_path: &Path,
) -> Result<PathBuf, CaptureError> {
    let path = sidecar_path(recording_path);
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize report: {}", e)))?;
    fs::write(&path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write report: {}", e)))?;
    Ok(path)
}

/// Read a session report back from its JSON sidecar file.
pub fn read_report(recording_path: &Path) -> Result<CaptureReport, CaptureError> {
    let json = fs::read_to_string(sidecar_path(recording_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read report: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse report: {}", e)))
}
