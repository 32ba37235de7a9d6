//! # rolling-capture-cpal
//!
//! Device-mode backend for rolling-capture, built on cpal.
//!
//! Provides:
//! - `CpalCapture`: `CaptureBackend` over any cpal host (ALSA, CoreAudio, WASAPI, JACK)
//! - `HostLease`: process-wide counted host lifecycle
//! - `list_input_devices`: input device names in `DeviceSelector::Index` order
//!
//! ## Usage
//! ```ignore
//! use rolling_capture_core::{CaptureConfiguration, CaptureSession};
//! use rolling_capture_cpal::CpalCapture;
//!
//! let config = CaptureConfiguration::default();
//! let mut session = CaptureSession::new(config.clone())?;
//! session.init_device(CpalCapture::from_config(&config), &config.device, config.sample_rate_hz)?;
//! session.start()?;
//! let last_two_seconds = session.query(2000)?;
//! ```

pub mod cpal_capture;
pub mod device_enumerator;
pub mod error;
pub mod host;

pub use cpal_capture::CpalCapture;
pub use error::CpalError;
pub use host::HostLease;

use rolling_capture_core::CaptureError;

/// Input device names on the named host (or the default host), in
/// enumeration order.
pub fn list_input_devices(host: Option<&str>) -> Result<Vec<String>, CaptureError> {
    let lease = HostLease::acquire(host)?;
    let names = device_enumerator::input_device_names(lease.host())?;
    for (index, name) in names.iter().enumerate() {
        log::debug!("capture device #{}: '{}'", index, name);
    }
    Ok(names)
}
