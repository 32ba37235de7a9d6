pub mod capture_backend;
pub mod capture_delegate;
pub mod event_poll;
pub mod stream_source;
