use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of polling the host application's event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    QuitRequested,
}

/// External event pump consulted by the application loop between queries.
///
/// The capture session never polls; the caller stops it on quit.
pub trait EventPoll {
    fn poll(&mut self) -> PollOutcome;
}

/// Cloneable quit flag. Any clone may request quit, e.g. from a signal
/// handler or a UI thread; every clone then polls `QuitRequested`.
#[derive(Debug, Clone, Default)]
pub struct QuitSignal {
    requested: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_quit(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_quit_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl EventPoll for QuitSignal {
    fn poll(&mut self) -> PollOutcome {
        if self.is_quit_requested() {
            PollOutcome::QuitRequested
        } else {
            PollOutcome::Continue
        }
    }
}
