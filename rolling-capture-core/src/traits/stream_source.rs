use crate::models::error::CaptureError;

/// Result of one read from a stream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRead {
    /// Samples appended to the output.
    pub samples: usize,
    /// The source has ended; no further data will arrive.
    pub end_of_source: bool,
}

impl SourceRead {
    pub const EMPTY: Self = Self {
        samples: 0,
        end_of_source: false,
    };

    pub const ENDED: Self = Self {
        samples: 0,
        end_of_source: true,
    };
}

/// Pull-driven byte source for stream mode (e.g. piped `f32le` audio).
pub trait StreamSource {
    /// Append up to `max_samples` samples to `out`.
    ///
    /// Zero samples without `end_of_source` means "nothing yet, try again".
    fn read_samples(&mut self, max_samples: usize, out: &mut Vec<f32>)
        -> Result<SourceRead, CaptureError>;
}
