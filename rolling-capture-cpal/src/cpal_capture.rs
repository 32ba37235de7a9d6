//! cpal capture backend.
//!
//! Opens an input device in the paused state, asking for mono f32 at the
//! requested rate with a fixed callback size. Devices that cannot do that
//! fall back to their default config; the data callback then converts to
//! f32 and down-mixes to mono before handing samples to the session.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    BufferSize, FromSample, Sample, SampleFormat, SampleRate, SizedSample, StreamConfig,
    SupportedBufferSize, SupportedStreamConfig, SupportedStreamConfigRange,
};

use rolling_capture_core::models::config::CaptureConfiguration;
use rolling_capture_core::processing::sample_codec::downmix_to_mono_into;
use rolling_capture_core::{
    CaptureBackend, CaptureError, DeviceSelector, NegotiatedFormat, SampleCallback, StreamRequest,
};

use crate::device_enumerator::{device_name, select_input_device};
use crate::error::CpalError;
use crate::host::HostLease;

/// Device-mode backend built on cpal.
///
/// The stream is `!Send` on some platforms, so this backend stays on the
/// thread that owns the session; only the data callback runs elsewhere.
pub struct CpalCapture {
    host_name: Option<String>,
    // field order matters on drop: the stream goes before the host lease
    stream: Option<cpal::Stream>,
    lease: Option<HostLease>,
}

impl CpalCapture {
    /// Backend on the platform's default audio host.
    pub fn new() -> Self {
        Self {
            host_name: None,
            stream: None,
            lease: None,
        }
    }

    /// Backend on a named audio host (e.g. "ALSA", "JACK", "WASAPI").
    pub fn with_host(name: impl Into<String>) -> Self {
        Self {
            host_name: Some(name.into()),
            stream: None,
            lease: None,
        }
    }

    pub fn from_config(config: &CaptureConfiguration) -> Self {
        Self {
            host_name: config.host.clone(),
            stream: None,
            lease: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&self) -> Result<&cpal::Stream, CpalError> {
        self.stream.as_ref().ok_or(CpalError::NotOpen)
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for CpalCapture {
    fn open(
        &mut self,
        device: &DeviceSelector,
        request: &StreamRequest,
        callback: SampleCallback,
    ) -> Result<NegotiatedFormat, CaptureError> {
        self.close();

        let lease = HostLease::acquire(self.host_name.as_deref())?;
        let device = select_input_device(lease.host(), device)?;
        let name = device_name(&device);
        log::info!("attempting to open capture device '{}'", name);

        let supported = negotiate(&device, request)?;
        let frames = fixed_buffer_size(supported.buffer_size(), request.frames_per_callback);
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: frames.map_or(BufferSize::Default, BufferSize::Fixed),
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, callback),
            SampleFormat::F64 => build_stream::<f64>(&device, &config, callback),
            SampleFormat::I8 => build_stream::<i8>(&device, &config, callback),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, callback),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, callback),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, callback),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, callback),
            SampleFormat::U32 => build_stream::<u32>(&device, &config, callback),
            other => return Err(CpalError::UnsupportedFormat(other).into()),
        }
        .map_err(CpalError::from)?;

        // Some hosts start streams on build; deliver nothing until resume.
        if let Err(e) = stream.pause() {
            log::debug!("could not pause freshly built stream: {}", e);
        }

        log::info!(
            "obtained spec for '{}': {} Hz, {} channel(s), {:?}, {}",
            name,
            config.sample_rate.0,
            config.channels,
            supported.sample_format(),
            frames.map_or("host-chosen frames per callback".to_string(), |f| {
                format!("{} frames per callback", f)
            })
        );

        self.stream = Some(stream);
        self.lease = Some(lease);

        Ok(NegotiatedFormat {
            device_name: name,
            sample_rate_hz: config.sample_rate.0,
            device_channels: config.channels,
            frames_per_callback: frames,
        })
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        self.stream()?.play().map_err(CpalError::from)?;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        self.stream()?.pause().map_err(CpalError::from)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            log::info!("input stream closed");
        }
        self.lease = None;
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pick the device config closest to the request: the requested rate in a
/// convertible sample format with the fewest channels, preferring f32.
/// Failing that, the convertible range whose rate is nearest the request.
/// The device default is the last resort. Outside the first case the
/// granted rate becomes authoritative.
fn negotiate(
    device: &cpal::Device,
    request: &StreamRequest,
) -> Result<SupportedStreamConfig, CpalError> {
    let ranges: Vec<SupportedStreamConfigRange> = device.supported_input_configs()?.collect();
    if let Some(config) = preferred_config(&ranges, request.sample_rate_hz) {
        return Ok(config);
    }
    if let Some(config) = nearest_config(&ranges, request.sample_rate_hz) {
        log::warn!(
            "device cannot capture {} Hz, using nearest supported {} Hz",
            request.sample_rate_hz,
            config.sample_rate().0
        );
        return Ok(config);
    }

    let fallback = device.default_input_config()?;
    log::warn!(
        "device cannot capture {} Hz, using its default {} Hz",
        request.sample_rate_hz,
        fallback.sample_rate().0
    );
    Ok(fallback)
}

fn preferred_config(
    ranges: &[SupportedStreamConfigRange],
    sample_rate_hz: u32,
) -> Option<SupportedStreamConfig> {
    let rate = SampleRate(sample_rate_hz);
    ranges
        .iter()
        .filter(|r| is_convertible(r.sample_format()))
        .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
        .min_by_key(|r| (r.channels(), r.sample_format() != SampleFormat::F32))
        .cloned()
        .map(|r| r.with_sample_rate(rate))
}

fn nearest_config(
    ranges: &[SupportedStreamConfigRange],
    sample_rate_hz: u32,
) -> Option<SupportedStreamConfig> {
    let nearest_rate = |r: &SupportedStreamConfigRange| {
        sample_rate_hz
            .max(r.min_sample_rate().0)
            .min(r.max_sample_rate().0)
    };
    ranges
        .iter()
        .filter(|r| is_convertible(r.sample_format()))
        .min_by_key(|r| {
            (
                nearest_rate(r).abs_diff(sample_rate_hz),
                r.channels(),
                r.sample_format() != SampleFormat::F32,
            )
        })
        .map(|r| {
            let rate = SampleRate(nearest_rate(r));
            r.clone().with_sample_rate(rate)
        })
}

fn is_convertible(format: SampleFormat) -> bool {
    matches!(
        format,
        SampleFormat::F32
            | SampleFormat::F64
            | SampleFormat::I8
            | SampleFormat::I16
            | SampleFormat::I32
            | SampleFormat::U8
            | SampleFormat::U16
            | SampleFormat::U32
    )
}

/// The requested callback size if the device accepts it.
fn fixed_buffer_size(supported: &SupportedBufferSize, requested: u32) -> Option<u32> {
    match supported {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&requested) => {
            Some(requested)
        }
        _ => None,
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    callback: SampleCallback,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + 'static,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels);
    let mut interleaved: Vec<f32> = Vec::new();
    let mut mono: Vec<f32> = Vec::new();

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            interleaved.clear();
            interleaved.extend(data.iter().map(|&s| s.to_sample::<f32>()));
            if channels > 1 {
                downmix_to_mono_into(&interleaved, channels, &mut mono);
                callback(&mono);
            } else {
                callback(&interleaved);
            }
        },
        |err| log::error!("audio input stream error: {}", err),
        None,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Range { min: 64, max: 4096 },
            format,
        )
    }

    #[test]
    fn prefers_mono_f32_at_requested_rate() {
        let ranges = vec![
            range(2, 8000, 48000, SampleFormat::F32),
            range(1, 8000, 48000, SampleFormat::I16),
            range(1, 8000, 48000, SampleFormat::F32),
        ];

        let config = preferred_config(&ranges, 16000).unwrap();

        assert_eq!(config.channels(), 1);
        assert_eq!(config.sample_format(), SampleFormat::F32);
        assert_eq!(config.sample_rate(), SampleRate(16000));
    }

    #[test]
    fn accepts_stereo_or_integer_formats_when_needed() {
        let ranges = vec![
            range(2, 44100, 48000, SampleFormat::I16),
            range(1, 44100, 44100, SampleFormat::I32),
        ];

        let config = preferred_config(&ranges, 48000).unwrap();

        assert_eq!(config.channels(), 2);
        assert_eq!(config.sample_format(), SampleFormat::I16);
    }

    #[test]
    fn i32_only_device_is_usable() {
        let ranges = vec![
            range(2, 8000, 48000, SampleFormat::I32),
            range(1, 8000, 48000, SampleFormat::I32),
        ];

        let config = preferred_config(&ranges, 16000).unwrap();

        assert_eq!(config.channels(), 1);
        assert_eq!(config.sample_format(), SampleFormat::I32);
        assert_eq!(config.sample_rate(), SampleRate(16000));
    }

    #[test]
    fn no_range_covers_rate() {
        let ranges = vec![range(1, 44100, 48000, SampleFormat::F32)];
        assert!(preferred_config(&ranges, 16000).is_none());
    }

    #[test]
    fn nearest_rate_used_when_request_is_out_of_range() {
        let ranges = vec![
            range(2, 96000, 192000, SampleFormat::F32),
            range(2, 44100, 48000, SampleFormat::I32),
        ];

        let config = nearest_config(&ranges, 16000).unwrap();

        assert_eq!(config.sample_rate(), SampleRate(44100));
        assert_eq!(config.sample_format(), SampleFormat::I32);
    }

    #[test]
    fn nearest_config_skips_unconvertible_formats() {
        let ranges = vec![range(1, 8000, 48000, SampleFormat::I64)];
        assert!(nearest_config(&ranges, 16000).is_none());
    }

    #[test]
    fn fixed_buffer_only_inside_supported_range() {
        let supported = SupportedBufferSize::Range { min: 256, max: 2048 };
        assert_eq!(fixed_buffer_size(&supported, 1024), Some(1024));
        assert_eq!(fixed_buffer_size(&supported, 4096), None);
        assert_eq!(fixed_buffer_size(&SupportedBufferSize::Unknown, 1024), None);
    }

    #[test]
    fn unknown_host_fails_as_backend_unavailable() {
        let mut backend = CpalCapture::with_host("no-such-audio-host");

        let err = backend
            .open(
                &DeviceSelector::Default,
                &StreamRequest::mono(16000, 1024),
                Arc::new(|_: &[f32]| {}),
            )
            .unwrap_err();

        assert!(matches!(err, CaptureError::BackendUnavailable(_)));
        assert!(!backend.is_open());
        assert_eq!(backend.resume(), Err(CaptureError::NoDevice));
    }

    #[test]
    fn host_taken_from_config() {
        let config = CaptureConfiguration {
            host: Some("JACK".into()),
            ..Default::default()
        };
        assert_eq!(CpalCapture::from_config(&config).host_name.as_deref(), Some("JACK"));
    }
}
