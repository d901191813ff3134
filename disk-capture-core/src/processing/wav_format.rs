//! RIFF/WAVE header layout used by the file sink.
//!
//! The header is written with a zero data size when the sink opens and the
//! size fields are patched in place when it closes.

use crate::traits::frame_sink::SinkSpec;

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Byte offset of the RIFF chunk size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Byte offset of the data chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

const FMT_CHUNK_SIZE: u32 = 16;

/// Canonical little-endian header for `data_size` bytes of `spec` samples.
///
/// ```text
/// RIFF <riff size> WAVE
/// fmt  16 <format tag> <channels> <rate> <byte rate> <block align> <bits>
/// data <data size>
/// ```
///
/// Format tag 1 is integer PCM, 3 is IEEE float.
pub fn wav_header(spec: &SinkSpec, data_size: u64) -> [u8; WAV_HEADER_SIZE] {
    let bits = spec.encoding.bit_depth();
    let block_align = spec.channels * (bits / 8);
    let byte_rate = spec.sample_rate * u32::from(block_align);

    let fields: [&[u8]; 13] = [
        b"RIFF",
        &riff_chunk_size(data_size).to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &FMT_CHUNK_SIZE.to_le_bytes(),
        &spec.encoding.format_tag().to_le_bytes(),
        &spec.channels.to_le_bytes(),
        &spec.sample_rate.to_le_bytes(),
        &byte_rate.to_le_bytes(),
        &block_align.to_le_bytes(),
        &bits.to_le_bytes(),
        b"data",
        &data_chunk_size(data_size).to_le_bytes(),
    ];

    let mut header = [0u8; WAV_HEADER_SIZE];
    let mut at = 0;
    for field in fields {
        header[at..at + field.len()].copy_from_slice(field);
        at += field.len();
    }
    debug_assert_eq!(at, WAV_HEADER_SIZE);
    header
}

/// RIFF chunk size for a file holding `data_size` bytes of samples.
pub fn riff_chunk_size(data_size: u64) -> u32 {
    (data_size + WAV_HEADER_SIZE as u64 - 8).min(u32::MAX as u64) as u32
}

/// Data chunk size, saturated to what the 32-bit field can hold.
pub fn data_chunk_size(data_size: u64) -> u32 {
    data_size.min(u32::MAX as u64) as u32
}
