use thiserror::Error;

/// Errors that can occur during rolling capture operations.
///
/// None of these abort the session; the caller decides whether to retry,
/// log, or give up. A stream source with no data yet is not an error, see
/// `PullOutcome::NoData`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("audio backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("failed to open capture device: {0}")]
    DeviceOpenFailed(String),

    #[error("no capture device open")]
    NoDevice,

    #[error("capture already running")]
    AlreadyRunning,

    #[error("capture not running")]
    NotRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("stream source failed: {0}")]
    SourceFailed(String),
}
