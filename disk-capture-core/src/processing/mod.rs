pub mod handoff;
pub mod ring_buffer;
pub mod sample_format;
pub mod wav_format;
