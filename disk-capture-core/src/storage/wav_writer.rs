use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::wav_format;
use crate::traits::frame_sink::{FrameSink, SinkOpener, SinkSpec};

/// Streaming WAV file sink.
///
/// ## File Format
/// ```text
/// [44-byte WAV header, sizes patched on close]
/// [interleaved samples in the requested encoding...]
/// ```
pub struct WavFileSink {
    file_path: PathBuf,
    spec: SinkSpec,
    writer: Option<BufWriter<File>>,
    data_bytes: u64,
    frames_written: u64,
    scratch: Vec<u8>,
}

impl WavFileSink {
    /// Create the file (and its parent directory) and write the initial header.
    pub fn create(file_path: impl Into<PathBuf>, spec: SinkSpec) -> Result<Self, CaptureError> {
        let file_path = file_path.into();
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(CaptureError::SinkOpen(format!(
                "invalid stream parameters: {} ch @ {} Hz",
                spec.channels, spec.sample_rate
            )));
        }

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::SinkOpen(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path).map_err(|e| {
            CaptureError::SinkOpen(format!("failed to create {}: {}", file_path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);

        let header = wav_format::wav_header(&spec, 0);
        writer
            .write_all(&header)
            .map_err(|e| CaptureError::SinkOpen(format!("failed to write header: {}", e)))?;

        Ok(Self {
            file_path,
            spec,
            writer: Some(writer),
            data_bytes: 0,
            frames_written: 0,
            scratch: Vec::new(),
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Sample bytes written so far, excluding the header.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn finalize(&mut self) -> io::Result<()> {
        let Some(writer) = self.writer.take() else {
            return Err(io::Error::new(io::ErrorKind::Other, "file is not open"));
        };
        let mut file = writer.into_inner().map_err(|e| e.into_error())?;

        file.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET))?;
        file.write_all(&wav_format::riff_chunk_size(self.data_bytes).to_le_bytes())?;

        file.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET))?;
        file.write_all(&wav_format::data_chunk_size(self.data_bytes).to_le_bytes())?;

        file.flush()?;
        file.sync_all()
    }
}

impl FrameSink for WavFileSink {
    fn write_frames(&mut self, samples: &[f32], frames: usize) -> Result<usize, CaptureError> {
        let wanted = frames * self.spec.channels as usize;
        if samples.len() < wanted {
            return Err(CaptureError::StorageError(format!(
                "{} samples supplied for {} frames of {} channels",
                samples.len(),
                frames,
                self.spec.channels
            )));
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open for writing".into()))?;

        self.spec.encoding.encode_into(&samples[..wanted], &mut self.scratch);
        writer
            .write_all(&self.scratch)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;

        self.data_bytes += self.scratch.len() as u64;
        self.frames_written += frames as u64;
        Ok(frames)
    }

    /// Patch the header sizes, flush, and return the SHA-256 of the file.
    fn close(&mut self) -> Result<Option<String>, CaptureError> {
        self.finalize().map_err(|e| {
            CaptureError::StorageError(format!(
                "failed to finalize {}: {}",
                self.file_path.display(),
                e
            ))
        })?;
        sha256_file(&self.file_path).map(Some)
    }
}

/// Opens a [`WavFileSink`] for each session. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavSinkOpener;

impl SinkOpener for WavSinkOpener {
    fn open(&mut self, path: &Path, spec: &SinkSpec) -> Result<Box<dyn FrameSink>, CaptureError> {
        Ok(Box::new(WavFileSink::create(path, *spec)?))
    }
}

/// Compute the SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let checksum_error = |e: io::Error| {
        CaptureError::StorageError(format!("failed to read file for checksum: {}", e))
    };
    let mut file = File::open(path).map_err(checksum_error)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(checksum_error)?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::sample_format::SampleEncoding;

    fn spec(encoding: SampleEncoding) -> SinkSpec {
        SinkSpec {
            sample_rate: 48000,
            channels: 2,
            encoding,
        }
    }

    #[test]
    fn write_pcm16_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.wav");

        let mut sink = WavFileSink::create(&path, spec(SampleEncoding::Pcm16)).unwrap();
        // 4 stereo frames = 8 samples = 16 bytes
        let samples = [0.0f32; 8];
        assert_eq!(sink.write_frames(&samples, 4).unwrap(), 4);
        assert_eq!(sink.frames_written(), 4);

        let checksum = sink.close().unwrap().unwrap();
        assert_eq!(checksum.len(), 64);

        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44 + 16);
        assert_eq!(&file_data[0..4], b"RIFF");
        assert_eq!(&file_data[8..12], b"WAVE");

        let data_size =
            u32::from_le_bytes([file_data[40], file_data[41], file_data[42], file_data[43]]);
        assert_eq!(data_size, 16);
        let riff_size =
            u32::from_le_bytes([file_data[4], file_data[5], file_data[6], file_data[7]]);
        assert_eq!(riff_size, 36 + 16);
    }

    #[test]
    fn readable_by_independent_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoded.wav");

        let mut sink = WavFileSink::create(&path, spec(SampleEncoding::Pcm16)).unwrap();
        let samples: Vec<f32> = (0..200).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        sink.write_frames(&samples, 100).unwrap();
        sink.close().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let wav_spec = reader.spec();
        assert_eq!(wav_spec.channels, 2);
        assert_eq!(wav_spec.sample_rate, 48000);
        assert_eq!(wav_spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 100);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), 200);
        assert_eq!(decoded[0], (0.5 * i16::MAX as f32) as i16);
        assert_eq!(decoded[1], (-0.5 * i16::MAX as f32) as i16);
    }

    #[test]
    fn float_wav_stores_raw_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");

        let mut sink = WavFileSink::create(&path, spec(SampleEncoding::Float32)).unwrap();
        sink.write_frames(&[0.25, -0.25], 1).unwrap();
        sink.close().unwrap();

        let file_data = fs::read(&path).unwrap();
        assert_eq!(u16::from_le_bytes([file_data[20], file_data[21]]), 3);
        assert_eq!(file_data.len(), 44 + 8);
        let left = f32::from_le_bytes([file_data[44], file_data[45], file_data[46], file_data[47]]);
        assert_eq!(left, 0.25);
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/takes/one.wav");

        let mut opener = WavSinkOpener;
        let mut sink = opener.open(&path, &spec(SampleEncoding::Pcm24)).unwrap();
        sink.write_frames(&[0.0, 0.0], 1).unwrap();
        sink.close().unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 6);
    }

    #[test]
    fn short_sample_slice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            WavFileSink::create(dir.path().join("short.wav"), spec(SampleEncoding::Pcm16)).unwrap();
        assert!(sink.write_frames(&[0.0], 1).is_err());
        assert_eq!(sink.frames_written(), 0);
    }

    #[test]
    fn double_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            WavFileSink::create(dir.path().join("twice.wav"), spec(SampleEncoding::Pcm16)).unwrap();
        sink.close().unwrap();
        assert!(matches!(sink.close(), Err(CaptureError::StorageError(_))));
        assert!(sink.write_frames(&[0.0, 0.0], 1).is_err());
    }

    #[test]
    fn open_fails_for_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();

        let result = WavFileSink::create(blocker.join("take.wav"), spec(SampleEncoding::Pcm16));
        assert!(matches!(result, Err(CaptureError::SinkOpen(_))));
    }
}
