//! # rolling-capture-core
//!
//! Platform-agnostic rolling audio capture.
//!
//! Keeps a fixed-duration window of the most recent mono f32 samples and
//! serves "the last N milliseconds" at any time. Samples arrive either from a
//! device backend pushing through a callback (`CaptureBackend`, implemented
//! by `rolling-capture-cpal`) or from a byte stream pulled on demand
//! (`StreamSource`, e.g. `ReaderSource` over stdin).
//!
//! ## Architecture
//!
//! ```text
//! rolling-capture-core (this crate)
//! ├── traits/       ← CaptureBackend, StreamSource, CaptureDelegate, EventPoll
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, diagnostics
//! ├── processing/   ← CaptureBuffer, f32le decoding
//! ├── session/      ← CaptureSession (device/stream orchestration)
//! └── sources/      ← ReaderSource
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{CaptureConfiguration, DeviceSelector};
pub use models::diagnostics::CaptureDiagnostics;
pub use models::error::CaptureError;
pub use models::state::{CaptureMode, CaptureState};
pub use processing::capture_buffer::CaptureBuffer;
pub use session::capture::{CaptureSession, PullOutcome};
pub use sources::reader_source::ReaderSource;
pub use traits::capture_backend::{CaptureBackend, NegotiatedFormat, SampleCallback, StreamRequest};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::event_poll::{EventPoll, PollOutcome, QuitSignal};
pub use traits::stream_source::{SourceRead, StreamSource};
