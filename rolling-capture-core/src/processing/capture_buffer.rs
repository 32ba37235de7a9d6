/// Fixed-capacity circular store holding the most recent samples.
///
/// Unlike a FIFO, reads do not consume: `latest` copies out the newest
/// samples and leaves the window intact. Wrap in `parking_lot::Mutex` for
/// cross-thread access; every method here assumes exclusive access.
///
/// Overflow behavior: new samples overwrite the oldest ones. A single batch
/// longer than the capacity keeps only its trailing `capacity` samples. This
/// favors the latest audio and is intended, not an error.
///
/// Invariant: the newest `valid` samples occupy
/// `[write_cursor - valid, write_cursor)` modulo `capacity`.
#[derive(Debug)]
pub struct CaptureBuffer {
    samples: Box<[f32]>,
    write_cursor: usize,
    valid: usize,
}

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
            write_cursor: 0,
            valid: 0,
        }
    }

    /// Write samples at the cursor, wrapping at most once.
    ///
    /// Returns how many leading samples of `incoming` were dropped because
    /// the batch alone exceeded the capacity.
    pub fn write(&mut self, incoming: &[f32]) -> usize {
        let capacity = self.capacity();
        if incoming.is_empty() || capacity == 0 {
            return 0;
        }

        let dropped = incoming.len().saturating_sub(capacity);
        let incoming = &incoming[dropped..];
        let n = incoming.len();

        let head = (capacity - self.write_cursor).min(n);
        self.samples[self.write_cursor..self.write_cursor + head].copy_from_slice(&incoming[..head]);
        if head < n {
            self.samples[..n - head].copy_from_slice(&incoming[head..]);
        }

        self.write_cursor = (self.write_cursor + n) % capacity;
        self.valid = (self.valid + n).min(capacity);
        dropped
    }

    /// Copy out the newest `count` samples, oldest first.
    ///
    /// Returns fewer samples if fewer are buffered; never pads.
    pub fn latest(&self, count: usize) -> Vec<f32> {
        let mut out = Vec::new();
        self.latest_into(count, &mut out);
        out
    }

    /// Like `latest`, but fills `out` (cleared first) instead of allocating.
    pub fn latest_into(&self, count: usize, out: &mut Vec<f32>) {
        out.clear();
        let n = count.min(self.valid);
        if n == 0 {
            return;
        }

        let capacity = self.capacity();
        let start = (self.write_cursor + capacity - n) % capacity;
        let head = (capacity - start).min(n);
        out.reserve_exact(n);
        out.extend_from_slice(&self.samples[start..start + head]);
        if head < n {
            out.extend_from_slice(&self.samples[..n - head]);
        }
    }

    /// Number of meaningful samples currently held.
    pub fn len(&self) -> usize {
        self.valid
    }

    pub fn is_empty(&self) -> bool {
        self.valid == 0
    }

    /// Forget all samples. Storage is kept, not reallocated.
    pub fn reset(&mut self) {
        self.write_cursor = 0;
        self.valid = 0;
    }

    /// Index the next sample will be written to.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }
}
