pub mod memory_sink;
pub mod report_sidecar;
pub mod wav_writer;
