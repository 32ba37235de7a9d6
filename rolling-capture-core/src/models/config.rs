use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Which capture device the backend should open.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSelector {
    /// The host's default input device.
    #[default]
    Default,
    /// Position in the host's input device enumeration.
    Index(usize),
    /// Exact device name as reported by the host.
    Name(String),
}

/// Configuration for a rolling capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Requested sample rate in Hz (default: 16000). Device mode may be
    /// granted a different rate by the backend.
    pub sample_rate_hz: u32,

    /// Length of the rolling window in milliseconds (default: 30000).
    pub retention_ms: u32,

    /// Frames per backend callback requested in device mode (default: 1024).
    pub frames_per_callback: u32,

    /// Capture device to open in device mode.
    pub device: DeviceSelector,

    /// Named audio host for the backend, or None for the platform default.
    pub host: Option<String>,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate_hz == 0 {
            return Err(CaptureError::InvalidConfig("sample rate must be positive".into()));
        }
        if self.retention_ms == 0 {
            return Err(CaptureError::InvalidConfig("retention window must be positive".into()));
        }
        if self.frames_per_callback == 0 {
            return Err(CaptureError::InvalidConfig(
                "frames per callback must be positive".into(),
            ));
        }
        window_capacity(self.sample_rate_hz, self.retention_ms)?;
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::InvalidConfig(format!("malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16000,
            retention_ms: 30_000,
            frames_per_callback: 1024,
            device: DeviceSelector::Default,
            host: None,
        }
    }
}

/// Number of samples a window of `retention_ms` holds at `sample_rate_hz`.
pub fn window_capacity(sample_rate_hz: u32, retention_ms: u32) -> Result<usize, CaptureError> {
    if sample_rate_hz == 0 {
        return Err(CaptureError::InvalidConfig("sample rate must be positive".into()));
    }
    let capacity = u64::from(sample_rate_hz) * u64::from(retention_ms) / 1000;
    if capacity == 0 {
        return Err(CaptureError::InvalidConfig(format!(
            "{} ms at {} Hz holds no samples",
            retention_ms, sample_rate_hz
        )));
    }
    usize::try_from(capacity)
        .map_err(|_| CaptureError::InvalidConfig("retention window too large".into()))
}
