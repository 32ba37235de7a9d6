//! `StreamSource` over any `std::io::Read`, decoding `f32le` samples.

use std::io::{self, ErrorKind, Read};

use crate::models::error::CaptureError;
use crate::processing::sample_codec::{decode_f32le_into, SAMPLE_BYTES};
use crate::traits::stream_source::{SourceRead, StreamSource};

/// Reads little-endian f32 samples from a byte stream such as a pipe.
///
/// A sample split across two reads is reassembled. `WouldBlock` and
/// `Interrupted` are reported as "no data yet"; `Ok(0)` is end of source.
pub struct ReaderSource<R: Read> {
    reader: R,
    pending: Vec<u8>,
    scratch: Vec<u8>,
    ended: bool,
}

impl ReaderSource<io::Stdin> {
    /// Source reading the process's standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(SAMPLE_BYTES),
            scratch: Vec::new(),
            ended: false,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> StreamSource for ReaderSource<R> {
    fn read_samples(
        &mut self,
        max_samples: usize,
        out: &mut Vec<f32>,
    ) -> Result<SourceRead, CaptureError> {
        if self.ended {
            return Ok(SourceRead::ENDED);
        }
        if max_samples == 0 {
            return Ok(SourceRead::EMPTY);
        }

        // pending never holds a whole sample, so this is at least one byte
        let want = max_samples * SAMPLE_BYTES - self.pending.len();
        self.scratch.resize(want, 0);

        match self.reader.read(&mut self.scratch) {
            Ok(0) => {
                if !self.pending.is_empty() {
                    log::warn!(
                        "stream ended mid-sample, dropping {} trailing bytes",
                        self.pending.len()
                    );
                    self.pending.clear();
                }
                self.ended = true;
                Ok(SourceRead::ENDED)
            }
            Ok(n) => {
                self.pending.extend_from_slice(&self.scratch[..n]);
                let before = out.len();
                let consumed = decode_f32le_into(&self.pending, out);
                self.pending.drain(..consumed);
                Ok(SourceRead {
                    samples: out.len() - before,
                    end_of_source: false,
                })
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(SourceRead::EMPTY)
            }
            Err(e) => Err(CaptureError::SourceFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use super::*;

    fn encode(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Reader replaying a fixed script of results, then end of stream.
    struct ScriptedReader {
        steps: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(bytes)) => {
                    assert!(bytes.len() <= buf.len(), "script step larger than request");
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
            }
        }
    }

    #[test]
    fn reads_at_most_the_requested_samples() {
        let mut source = ReaderSource::new(Cursor::new(encode(&[1.0, 2.0, 3.0, 4.0, 5.0])));
        let mut out = Vec::new();

        let first = source.read_samples(2, &mut out).unwrap();
        assert_eq!(first, SourceRead { samples: 2, end_of_source: false });
        assert_eq!(out, vec![1.0, 2.0]);

        let second = source.read_samples(10, &mut out).unwrap();
        assert_eq!(second.samples, 3);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(source.read_samples(10, &mut out).unwrap(), SourceRead::ENDED);
        assert!(source.is_ended());
    }

    #[test]
    fn reassembles_sample_split_across_reads() {
        let bytes = encode(&[0.5, -0.25]);
        let mut source = ReaderSource::new(ScriptedReader {
            steps: VecDeque::from(vec![Ok(bytes[..6].to_vec()), Ok(bytes[6..].to_vec())]),
        });
        let mut out = Vec::new();

        assert_eq!(source.read_samples(4, &mut out).unwrap().samples, 1);
        assert_eq!(source.read_samples(4, &mut out).unwrap().samples, 1);
        assert_eq!(out, vec![0.5, -0.25]);
    }

    #[test]
    fn would_block_is_not_end_of_source() {
        let mut source = ReaderSource::new(ScriptedReader {
            steps: VecDeque::from(vec![
                Err(io::Error::from(ErrorKind::WouldBlock)),
                Err(io::Error::from(ErrorKind::Interrupted)),
                Ok(encode(&[3.0])),
            ]),
        });
        let mut out = Vec::new();

        assert_eq!(source.read_samples(8, &mut out).unwrap(), SourceRead::EMPTY);
        assert_eq!(source.read_samples(8, &mut out).unwrap(), SourceRead::EMPTY);
        assert_eq!(source.read_samples(8, &mut out).unwrap().samples, 1);
        assert_eq!(out, vec![3.0]);
    }

    #[test]
    fn hard_errors_surface_as_source_failed() {
        let mut source = ReaderSource::new(ScriptedReader {
            steps: VecDeque::from(vec![Err(io::Error::new(ErrorKind::BrokenPipe, "pipe closed"))]),
        });

        let err = source.read_samples(8, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CaptureError::SourceFailed(msg) if msg.contains("pipe closed")));
    }

    #[test]
    fn partial_sample_at_end_is_dropped() {
        let mut bytes = encode(&[1.5]);
        bytes.push(0xAA);
        let mut source = ReaderSource::new(Cursor::new(bytes));
        let mut out = Vec::new();

        assert_eq!(source.read_samples(4, &mut out).unwrap().samples, 1);
        assert_eq!(source.read_samples(4, &mut out).unwrap(), SourceRead::ENDED);
        assert_eq!(out, vec![1.5]);
    }
}
