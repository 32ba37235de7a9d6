pub mod capture_buffer;
pub mod sample_codec;
