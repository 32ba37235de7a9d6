use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::config::{window_capacity, CaptureConfiguration, DeviceSelector};
use crate::models::diagnostics::{CaptureDiagnostics, IngestCounters};
use crate::models::error::CaptureError;
use crate::models::state::{CaptureMode, CaptureState};
use crate::processing::capture_buffer::CaptureBuffer;
use crate::processing::sample_codec;
use crate::traits::capture_backend::{CaptureBackend, NegotiatedFormat, StreamRequest};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::stream_source::StreamSource;

/// Result of one stream-mode pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// This many samples were read and ingested.
    Ingested(usize),
    /// Nothing available right now; try again later.
    NoData,
    /// The source has ended. Further pulls are no-ops.
    Exhausted,
}

/// Buffer plus producer counters, guarded together so one lock covers the
/// whole cursor/count/content update.
struct Window {
    buffer: CaptureBuffer,
    counters: IngestCounters,
}

/// State shared between the session and the backend's audio thread.
struct SharedCapture {
    running: AtomicBool,
    window: Mutex<Window>,
}

impl SharedCapture {
    fn new(capacity: usize) -> Self {
        Self {
            running: AtomicBool::new(false),
            window: Mutex::new(Window {
                buffer: CaptureBuffer::new(capacity),
                counters: IngestCounters::default(),
            }),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Producer entry point. Safe to call from any thread.
    fn ingest(&self, samples: &[f32]) {
        if !self.is_running() || samples.is_empty() {
            return;
        }

        let dropped = {
            let mut window = self.window.lock();
            let dropped = window.buffer.write(samples);
            window.counters.batches += 1;
            window.counters.samples += samples.len() as u64;
            window.counters.truncated += dropped as u64;
            dropped
        };

        if dropped > 0 {
            log::debug!(
                "batch of {} samples exceeds window, kept newest {}",
                samples.len(),
                samples.len() - dropped
            );
        }
    }
}

struct StreamInput {
    source: Box<dyn StreamSource>,
    exhausted: bool,
    scratch: Vec<f32>,
}

enum Input {
    Uninitialized,
    Device {
        backend: Box<dyn CaptureBackend>,
        format: NegotiatedFormat,
    },
    Stream(StreamInput),
}

impl Input {
    fn mode(&self) -> Option<CaptureMode> {
        match self {
            Self::Uninitialized => None,
            Self::Device { .. } => Some(CaptureMode::Device),
            Self::Stream(_) => Some(CaptureMode::Stream),
        }
    }
}

/// Rolling capture session: keeps the last `retention_ms` of audio and
/// serves "the most recent N milliseconds" on demand.
///
/// ```text
/// device mode:  [backend thread] → callback → ingest ─┐
///                                                     ├→ [CaptureBuffer] → query
/// stream mode:  query → pull_stream → [source] → ingest┘
/// ```
///
/// Every buffer mutation and every read happens under one
/// `parking_lot::Mutex`, so a query never sees a half-written batch.
pub struct CaptureSession {
    id: Uuid,
    config: CaptureConfiguration,
    input: Input,
    sample_rate_hz: u32,
    shared: Arc<SharedCapture>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    started_at: Option<DateTime<Utc>>,
    stream_pulls: u64,
}

impl CaptureSession {
    /// Create an uninitialized session. `config.retention_ms` fixes the
    /// window length; the sample rate is fixed by `init_device`/`init_stream`.
    pub fn new(config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            input: Input::Uninitialized,
            sample_rate_hz: 0,
            shared: Arc::new(SharedCapture::new(0)),
            delegate: None,
            started_at: None,
            stream_pulls: 0,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Open a capture device through `backend` and size the window from the
    /// rate the backend actually granted.
    ///
    /// On failure the session is left uninitialized and may be retried.
    pub fn init_device(
        &mut self,
        backend: impl CaptureBackend + 'static,
        device: &DeviceSelector,
        sample_rate_hz: u32,
    ) -> Result<(), CaptureError> {
        if sample_rate_hz == 0 {
            return Err(CaptureError::InvalidConfig("sample rate must be positive".into()));
        }
        self.teardown();

        let mut backend: Box<dyn CaptureBackend> = Box::new(backend);
        // Capacity is unknown until the backend reports its rate; the
        // callback is inert until `start`, so it can target a placeholder.
        let pending = Arc::new(SharedCapture::new(0));
        let producer = Arc::clone(&pending);
        let request = StreamRequest::mono(sample_rate_hz, self.config.frames_per_callback);

        let format = backend.open(
            device,
            &request,
            Arc::new(move |samples: &[f32]| producer.ingest(samples)),
        )?;

        let capacity = match window_capacity(format.sample_rate_hz, self.config.retention_ms) {
            Ok(capacity) => capacity,
            Err(e) => {
                backend.close();
                return Err(e);
            }
        };
        *pending.window.lock() = Window {
            buffer: CaptureBuffer::new(capacity),
            counters: IngestCounters::default(),
        };

        if format.sample_rate_hz != sample_rate_hz {
            log::warn!(
                "requested {} Hz, device '{}' granted {} Hz",
                sample_rate_hz,
                format.device_name,
                format.sample_rate_hz
            );
        }
        log::info!(
            "session {}: device '{}' open at {} Hz, {} ms window ({} samples)",
            self.id,
            format.device_name,
            format.sample_rate_hz,
            self.config.retention_ms,
            capacity
        );

        self.sample_rate_hz = format.sample_rate_hz;
        self.shared = pending;
        self.input = Input::Device { backend, format };
        self.notify_state();
        Ok(())
    }

    /// Prepare pull-driven capture from `source`. No rate negotiation.
    pub fn init_stream(
        &mut self,
        source: impl StreamSource + 'static,
        sample_rate_hz: u32,
    ) -> Result<(), CaptureError> {
        let capacity = window_capacity(sample_rate_hz, self.config.retention_ms)?;
        self.teardown();

        log::info!(
            "session {}: stream input at {} Hz, {} ms window ({} samples)",
            self.id,
            sample_rate_hz,
            self.config.retention_ms,
            capacity
        );

        self.sample_rate_hz = sample_rate_hz;
        self.shared = Arc::new(SharedCapture::new(capacity));
        self.input = Input::Stream(StreamInput {
            source: Box::new(source),
            exhausted: false,
            scratch: Vec::with_capacity(pull_quantum(sample_rate_hz)),
        });
        self.notify_state();
        Ok(())
    }

    /// Begin accepting samples. Transitions: ready → running.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        match &mut self.input {
            Input::Uninitialized => return Err(CaptureError::NoDevice),
            Input::Device { backend, .. } => {
                if self.shared.is_running() {
                    return Err(CaptureError::AlreadyRunning);
                }
                self.shared.set_running(true);
                if let Err(e) = backend.resume() {
                    self.shared.set_running(false);
                    return Err(e);
                }
            }
            Input::Stream(_) => {
                if self.shared.is_running() {
                    return Err(CaptureError::AlreadyRunning);
                }
                self.shared.set_running(true);
            }
        }

        self.started_at = Some(Utc::now());
        log::info!("session {}: capture started", self.id);
        self.notify_state();
        Ok(())
    }

    /// Stop accepting samples. Transitions: running → ready.
    ///
    /// A callback already inside `ingest` completes; later ones are ignored.
    /// The session is stopped even when the backend fails to pause; that
    /// failure is still returned.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        let paused = match &mut self.input {
            Input::Uninitialized => return Err(CaptureError::NoDevice),
            Input::Device { backend, .. } => {
                if !self.shared.is_running() {
                    return Err(CaptureError::NotRunning);
                }
                self.shared.set_running(false);
                backend.pause()
            }
            Input::Stream(_) => {
                if !self.shared.is_running() {
                    return Err(CaptureError::NotRunning);
                }
                self.shared.set_running(false);
                Ok(())
            }
        };

        if let Err(ref e) = paused {
            log::warn!("session {}: backend failed to pause: {}", self.id, e);
        }
        log::info!("session {}: capture stopped", self.id);
        self.notify_state();
        paused
    }

    /// Empty the window without reallocating it.
    ///
    /// Device mode requires a running session; stream mode always resets.
    pub fn reset(&mut self) -> Result<(), CaptureError> {
        match self.input {
            Input::Uninitialized => return Err(CaptureError::NoDevice),
            Input::Device { .. } if !self.shared.is_running() => {
                return Err(CaptureError::NotRunning)
            }
            _ => {}
        }

        self.shared.window.lock().buffer.reset();
        log::debug!("session {}: window reset", self.id);
        Ok(())
    }

    /// Producer entry point for decoded samples. Ignored unless running.
    pub fn ingest(&self, samples: &[f32]) {
        self.shared.ingest(samples);
    }

    /// Producer entry point for raw `f32le` bytes. Ignored unless running.
    pub fn ingest_bytes(&self, bytes: &[u8]) {
        if !self.shared.is_running() {
            return;
        }
        self.shared.ingest(&sample_codec::decode_f32le(bytes));
    }

    /// Read one quantum (100 ms) from the stream source into the window.
    pub fn pull_stream(&mut self) -> Result<PullOutcome, CaptureError> {
        let stream = match &mut self.input {
            Input::Stream(stream) => stream,
            Input::Uninitialized => return Err(CaptureError::NoDevice),
            Input::Device { .. } => {
                return Err(CaptureError::InvalidConfig(
                    "pull_stream requires stream input".into(),
                ))
            }
        };

        if stream.exhausted {
            return Ok(PullOutcome::Exhausted);
        }
        if !self.shared.is_running() {
            return Err(CaptureError::NotRunning);
        }

        self.stream_pulls += 1;
        stream.scratch.clear();
        let read = stream
            .source
            .read_samples(pull_quantum(self.sample_rate_hz), &mut stream.scratch)?;

        // the source's count is advisory; the scratch length is what was read
        let samples = read.samples.min(stream.scratch.len());
        if samples > 0 {
            self.shared.ingest(&stream.scratch[..samples]);
        }

        if read.end_of_source {
            stream.exhausted = true;
            log::info!("session {}: end of stream reached", self.id);
            if let Some(ref delegate) = self.delegate {
                delegate.on_stream_exhausted();
            }
        }

        Ok(match samples {
            0 if stream.exhausted => PullOutcome::Exhausted,
            0 => PullOutcome::NoData,
            n => PullOutcome::Ingested(n),
        })
    }

    /// The most recent `duration_ms` of audio, oldest sample first.
    ///
    /// `duration_ms <= 0` asks for the whole window. Returns what is buffered
    /// up to that length; never waits and never pads.
    pub fn query(&mut self, duration_ms: i64) -> Result<Vec<f32>, CaptureError> {
        let mut out = Vec::new();
        self.query_into(duration_ms, &mut out)?;
        Ok(out)
    }

    /// Like `query`, but fills `out` (cleared first) instead of allocating.
    pub fn query_into(&mut self, duration_ms: i64, out: &mut Vec<f32>) -> Result<(), CaptureError> {
        out.clear();
        let running = self.shared.is_running();

        match self.input.mode() {
            None => return Err(CaptureError::NoDevice),
            Some(CaptureMode::Stream) if running => {
                // best-effort top-up; a failed pull still serves what is buffered
                if let Err(e) = self.pull_stream() {
                    log::warn!("session {}: stream pull failed: {}", self.id, e);
                }
            }
            Some(_) => {}
        }

        if !running {
            return Err(CaptureError::NotRunning);
        }

        let window_ms = if duration_ms <= 0 {
            u64::from(self.config.retention_ms)
        } else {
            duration_ms as u64
        };
        let wanted = window_ms.saturating_mul(u64::from(self.sample_rate_hz)) / 1000;
        let wanted = usize::try_from(wanted).unwrap_or(usize::MAX);

        self.shared.window.lock().buffer.latest_into(wanted, out);
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CaptureState {
        match self.input {
            Input::Uninitialized => CaptureState::Uninitialized,
            _ if self.shared.is_running() => CaptureState::Running,
            _ => CaptureState::Ready,
        }
    }

    pub fn mode(&self) -> Option<CaptureMode> {
        self.input.mode()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn is_stream_exhausted(&self) -> bool {
        matches!(&self.input, Input::Stream(stream) if stream.exhausted)
    }

    /// Format granted by the backend, in device mode.
    pub fn negotiated_format(&self) -> Option<&NegotiatedFormat> {
        match &self.input {
            Input::Device { format, .. } => Some(format),
            _ => None,
        }
    }

    /// Authoritative sample rate, or 0 before initialization.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn retention_ms(&self) -> u32 {
        self.config.retention_ms
    }

    pub fn capacity(&self) -> usize {
        self.shared.window.lock().buffer.capacity()
    }

    pub fn buffered_samples(&self) -> usize {
        self.shared.window.lock().buffer.len()
    }

    /// Buffered audio length in whole milliseconds.
    pub fn buffered_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.buffered_samples() as u64 * 1000 / u64::from(self.sample_rate_hz)
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        let counters = self.shared.window.lock().counters;
        CaptureDiagnostics {
            mode: self.mode(),
            started_at: self.started_at,
            ingest_batches: counters.batches,
            samples_ingested: counters.samples,
            samples_truncated: counters.truncated,
            stream_pulls: self.stream_pulls,
            stream_exhausted: self.is_stream_exhausted(),
            ..CaptureDiagnostics::new(self.id)
        }
    }

    // --- Internal helpers ---

    fn notify_state(&self) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(self.state(), self.mode());
        }
    }

    /// Stop ingestion and release whatever input is open.
    fn teardown(&mut self) {
        self.shared.set_running(false);
        match std::mem::replace(&mut self.input, Input::Uninitialized) {
            Input::Uninitialized => return,
            Input::Device { mut backend, format } => {
                backend.close();
                log::info!("session {}: closed device '{}'", self.id, format.device_name);
            }
            Input::Stream(_) => {
                log::debug!("session {}: released stream input", self.id);
            }
        }
        self.sample_rate_hz = 0;
        self.started_at = None;
        self.stream_pulls = 0;
        self.shared = Arc::new(SharedCapture::new(0));
        self.notify_state();
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Samples read per stream pull: 100 ms of audio.
fn pull_quantum(sample_rate_hz: u32) -> usize {
    (sample_rate_hz / 10).max(1) as usize
}
