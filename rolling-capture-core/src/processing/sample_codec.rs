/// Size of one `f32le` sample on the wire.
pub const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Decode little-endian 32-bit float samples.
///
/// Trailing bytes that do not form a whole sample are ignored.
pub fn decode_f32le(bytes: &[u8]) -> Vec<f32> {
    let mut out = Vec::with_capacity(bytes.len() / SAMPLE_BYTES);
    decode_f32le_into(bytes, &mut out);
    out
}

/// Append decoded samples to `out`. Returns the number of bytes consumed.
pub fn decode_f32le_into(bytes: &[u8], out: &mut Vec<f32>) -> usize {
    let chunks = bytes.chunks_exact(SAMPLE_BYTES);
    let consumed = bytes.len() - chunks.remainder().len();
    out.extend(chunks.map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])));
    consumed
}

/// Down-mix interleaved multi-channel audio to mono by averaging channels.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() / channels.max(1));
    downmix_to_mono_into(samples, channels, &mut out);
    out
}

/// Like [`downmix_to_mono`], but replaces the contents of `out`, keeping its
/// allocation. Safe to call from an audio callback once `out` has grown.
pub fn downmix_to_mono_into(samples: &[f32], channels: usize, out: &mut Vec<f32>) {
    out.clear();
    if channels <= 1 {
        out.extend_from_slice(samples);
        return;
    }
    out.extend(
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn encode(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_little_endian_floats() {
        let bytes = encode(&[0.5, -1.0, 0.125]);
        assert_eq!(decode_f32le(&bytes), vec![0.5, -1.0, 0.125]);
    }

    #[test]
    fn trailing_partial_sample_is_left_unconsumed() {
        let mut bytes = encode(&[0.25]);
        bytes.extend_from_slice(&[0x00, 0x00]);
        let mut out = Vec::new();

        let consumed = decode_f32le_into(&bytes, &mut out);

        assert_eq!(consumed, 4);
        assert_eq!(out, vec![0.25]);
    }

    #[test]
    fn downmix_averages_frames() {
        let mono = downmix_to_mono(&[0.2, 0.4, -1.0, 1.0, 0.3, 0.3], 2);
        assert_eq!(mono.len(), 3);
        assert_relative_eq!(mono[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(mono[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(mono[2], 0.3, epsilon = 1e-6);
    }

    #[test]
    fn downmix_into_reuses_output() {
        let mut out = Vec::with_capacity(8);
        let ptr = out.as_ptr();

        downmix_to_mono_into(&[1.0, 0.0, 0.5, 0.5], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5]);

        downmix_to_mono_into(&[0.25, 0.25, 0.25], 3, &mut out);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0], 0.25, epsilon = 1e-6);
        assert_eq!(out.as_ptr(), ptr);
    }

    #[test]
    fn downmix_mono_is_passthrough() {
        assert_eq!(downmix_to_mono(&[1.0, 2.0], 1), vec![1.0, 2.0]);
    }
}
