use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::state::CaptureMode;

/// Diagnostics for debugging capture sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureDiagnostics {
    pub session_id: Uuid,
    pub mode: Option<CaptureMode>,
    /// When the session last entered the running state.
    pub started_at: Option<DateTime<Utc>>,
    pub ingest_batches: u64,
    pub samples_ingested: u64,
    /// Samples discarded because a single batch exceeded the buffer capacity.
    pub samples_truncated: u64,
    pub stream_pulls: u64,
    pub stream_exhausted: bool,
}

impl CaptureDiagnostics {
    pub(crate) fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            mode: None,
            started_at: None,
            ingest_batches: 0,
            samples_ingested: 0,
            samples_truncated: 0,
            stream_pulls: 0,
            stream_exhausted: false,
        }
    }
}

/// Counters updated by the producer under the buffer lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IngestCounters {
    pub batches: u64,
    pub samples: u64,
    pub truncated: u64,
}
