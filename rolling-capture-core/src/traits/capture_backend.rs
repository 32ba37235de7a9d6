use std::sync::Arc;

use crate::models::config::DeviceSelector;
use crate::models::error::CaptureError;

/// Producer callback invoked by a backend whenever captured audio is ready.
///
/// `samples` is mono f32. The callback fires on the backend's audio thread
/// and returns after one bounded copy under the buffer lock.
pub type SampleCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// What the session asks the backend for when opening a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub sample_rate_hz: u32,
    /// Always 1; the callback contract is mono.
    pub channels: u16,
    pub frames_per_callback: u32,
}

impl StreamRequest {
    pub fn mono(sample_rate_hz: u32, frames_per_callback: u32) -> Self {
        Self {
            sample_rate_hz,
            channels: 1,
            frames_per_callback,
        }
    }
}

/// What the backend actually obtained. `sample_rate_hz` is authoritative
/// for sizing the capture window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    pub device_name: String,
    pub sample_rate_hz: u32,
    /// Channels delivered by the device before any down-mix in the backend.
    pub device_channels: u16,
    /// Fixed callback size, or None if the host picks it.
    pub frames_per_callback: Option<u32>,
}

/// Interface for platform audio backends used in device mode.
///
/// Implemented by `CpalCapture` in `rolling-capture-cpal`. Control calls come
/// from the thread that owns the session; only the callback crosses threads.
pub trait CaptureBackend {
    /// Open a capture device in the paused state and register `callback`.
    ///
    /// Fails with `BackendUnavailable` if the audio host cannot be brought
    /// up, or `DeviceOpenFailed` if no matching device can be opened.
    fn open(
        &mut self,
        device: &DeviceSelector,
        request: &StreamRequest,
        callback: SampleCallback,
    ) -> Result<NegotiatedFormat, CaptureError>;

    /// Begin (or continue) delivering callbacks.
    fn resume(&mut self) -> Result<(), CaptureError>;

    /// Suspend callback delivery without closing the device.
    fn pause(&mut self) -> Result<(), CaptureError>;

    /// Close the device and release backend resources. Idempotent.
    fn close(&mut self);
}
