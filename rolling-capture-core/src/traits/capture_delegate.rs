use crate::models::state::{CaptureMode, CaptureState};

/// Event delegate for capture session notifications.
///
/// Called on the thread driving the session, never from the audio callback.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: CaptureState, mode: Option<CaptureMode>);

    /// Called once when a stream-mode source reports end of data.
    fn on_stream_exhausted(&self) {}
}
