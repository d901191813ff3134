use std::sync::atomic::{AtomicU8, Ordering};

/// Session controller state machine.
///
/// State transitions:
/// ```text
/// uninitialized → configured → armed → capturing → closed
/// ```
/// Reaching the target frame count ends capture immediately; there is no
/// separate draining phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    Configured,
    Armed,
    Capturing,
    Closed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Configured => "configured",
            Self::Armed => "armed",
            Self::Capturing => "capturing",
            Self::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Capture gate read by the process callback once per cycle.
///
/// `Armed` always precedes `Active`; the callback only writes while `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CaptureStatus {
    #[default]
    Uninitialized = 0,
    Armed = 1,
    Active = 2,
    Closed = 3,
}

impl CaptureStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Armed,
            2 => Self::Active,
            3 => Self::Closed,
            _ => Self::Uninitialized,
        }
    }
}

/// Lock-free cell holding a [`CaptureStatus`].
#[derive(Debug, Default)]
pub struct AtomicCaptureStatus(AtomicU8);

impl AtomicCaptureStatus {
    pub fn new(status: CaptureStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> CaptureStatus {
        CaptureStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, status: CaptureStatus) {
        self.0.store(status as u8, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.load() == CaptureStatus::Active
    }
}
