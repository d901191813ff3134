pub mod audio_engine;
pub mod capture_delegate;
pub mod frame_sink;
