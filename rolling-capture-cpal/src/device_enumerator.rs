//! Input device enumeration and selection.

use cpal::traits::{DeviceTrait, HostTrait};

use rolling_capture_core::DeviceSelector;

use crate::error::CpalError;

/// Names of the host's input devices, in enumeration order.
///
/// `DeviceSelector::Index` refers to positions in this list.
pub fn input_device_names(host: &cpal::Host) -> Result<Vec<String>, CpalError> {
    Ok(host
        .input_devices()?
        .map(|device| device_name(&device))
        .collect())
}

/// Resolve a selector to a concrete input device.
pub fn select_input_device(
    host: &cpal::Host,
    selector: &DeviceSelector,
) -> Result<cpal::Device, CpalError> {
    match selector {
        DeviceSelector::Default => host
            .default_input_device()
            .ok_or_else(|| CpalError::NoMatchingDevice("the default input".into())),
        DeviceSelector::Index(index) => host
            .input_devices()?
            .nth(*index)
            .ok_or_else(|| CpalError::NoMatchingDevice(format!("index {}", index))),
        DeviceSelector::Name(name) => host
            .input_devices()?
            .find(|device| device.name().map(|n| n == *name).unwrap_or(false))
            .ok_or_else(|| CpalError::NoMatchingDevice(format!("name '{}'", name))),
    }
}

pub(crate) fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "unknown".into())
}
