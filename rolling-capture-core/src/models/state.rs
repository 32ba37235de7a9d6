use serde::{Deserialize, Serialize};

/// How samples reach the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// A backend thread pushes samples through the producer callback.
    Device,
    /// The consumer pulls samples from a byte source before each query.
    Stream,
}

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// uninitialized → (init_device | init_stream) → ready ⇄ running
///                                                (start / stop)
/// ```
/// `reset` leaves the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Uninitialized,
    Ready,
    Running,
}

impl CaptureState {
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}
