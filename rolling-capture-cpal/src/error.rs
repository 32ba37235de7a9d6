use thiserror::Error;

use rolling_capture_core::CaptureError;

/// cpal-level failures, folded into `CaptureError` at the backend boundary.
#[derive(Debug, Error)]
pub enum CpalError {
    #[error("unknown audio host '{0}'")]
    UnknownHost(String),

    #[error(transparent)]
    HostUnavailable(#[from] cpal::HostUnavailable),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("no input device matches {0}")]
    NoMatchingDevice(String),

    #[error("failed to query supported configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("no default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("failed to pause input stream: {0}")]
    Pause(#[from] cpal::PauseStreamError),

    #[error("no input stream open")]
    NotOpen,
}

impl From<CpalError> for CaptureError {
    fn from(err: CpalError) -> Self {
        match err {
            CpalError::NotOpen => CaptureError::NoDevice,
            CpalError::UnknownHost(_)
            | CpalError::HostUnavailable(_)
            | CpalError::Devices(_)
            | CpalError::Play(_)
            | CpalError::Pause(_) => CaptureError::BackendUnavailable(err.to_string()),
            CpalError::NoMatchingDevice(_)
            | CpalError::SupportedConfigs(_)
            | CpalError::DefaultConfig(_)
            | CpalError::UnsupportedFormat(_)
            | CpalError::Build(_) => CaptureError::DeviceOpenFailed(err.to_string()),
        }
    }
}
