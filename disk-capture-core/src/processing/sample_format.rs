/// On-disk encoding of one sample, chosen from the requested bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// 16-bit signed little-endian PCM.
    Pcm16,
    /// 24-bit signed little-endian PCM, packed in 3 bytes.
    Pcm24,
    /// 32-bit IEEE float, little-endian.
    Float32,
}

impl SampleEncoding {
    pub fn from_bit_depth(bit_depth: u16) -> Option<Self> {
        match bit_depth {
            16 => Some(Self::Pcm16),
            24 => Some(Self::Pcm24),
            32 => Some(Self::Float32),
            _ => None,
        }
    }

    pub fn bit_depth(&self) -> u16 {
        match self {
            Self::Pcm16 => 16,
            Self::Pcm24 => 24,
            Self::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth() as usize / 8
    }

    /// WAVE `fmt ` format tag: 1 for integer PCM, 3 for IEEE float.
    pub fn format_tag(&self) -> u16 {
        match self {
            Self::Pcm16 | Self::Pcm24 => 1,
            Self::Float32 => 3,
        }
    }

    /// Encode `samples` (`[-1.0, 1.0]`) into `out`, which is cleared first.
    ///
    /// Integer encodings clamp out-of-range values.
    pub fn encode_into(&self, samples: &[f32], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(samples.len() * self.bytes_per_sample());
        match self {
            Self::Pcm16 => {
                for &sample in samples {
                    let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
            Self::Pcm24 => {
                const MAX_24: f32 = 8_388_607.0;
                for &sample in samples {
                    let value = (sample.clamp(-1.0, 1.0) * MAX_24) as i32;
                    out.extend_from_slice(&value.to_le_bytes()[..3]);
                }
            }
            Self::Float32 => {
                for &sample in samples {
                    out.extend_from_slice(&sample.to_le_bytes());
                }
            }
        }
    }
}

/// Decode native-endian `f32` sample units from raw ring bytes into `out`.
///
/// `bytes.len()` must be a multiple of the sample-unit size; a trailing
/// partial unit is ignored.
pub fn decode_units(bytes: &[u8], out: &mut Vec<f32>) {
    out.clear();
    out.extend(
        bytes
            .chunks_exact(std::mem::size_of::<f32>())
            .map(|unit| f32::from_ne_bytes([unit[0], unit[1], unit[2], unit[3]])),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bit_depth_mapping() {
        assert_eq!(SampleEncoding::from_bit_depth(16), Some(SampleEncoding::Pcm16));
        assert_eq!(SampleEncoding::from_bit_depth(24), Some(SampleEncoding::Pcm24));
        assert_eq!(SampleEncoding::from_bit_depth(32), Some(SampleEncoding::Float32));
        assert_eq!(SampleEncoding::from_bit_depth(8), None);
        assert_eq!(SampleEncoding::Float32.format_tag(), 3);
        assert_eq!(SampleEncoding::Pcm24.bytes_per_sample(), 3);
    }

    #[test]
    fn pcm16_clamps_and_scales() {
        let mut out = Vec::new();
        SampleEncoding::Pcm16.encode_into(&[0.0, 1.0, -1.0, 2.0], &mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(i16::from_le_bytes([out[0], out[1]]), 0);
        assert_eq!(i16::from_le_bytes([out[2], out[3]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([out[4], out[5]]), -i16::MAX);
        assert_eq!(i16::from_le_bytes([out[6], out[7]]), i16::MAX);
    }

    #[test]
    fn pcm24_packs_three_bytes() {
        let mut out = Vec::new();
        SampleEncoding::Pcm24.encode_into(&[1.0, -1.0], &mut out);
        assert_eq!(out, vec![0xFF, 0xFF, 0x7F, 0x01, 0x00, 0x80]);
    }

    #[test]
    fn float32_is_passthrough() {
        let mut out = Vec::new();
        SampleEncoding::Float32.encode_into(&[0.25, -0.5], &mut out);
        assert_relative_eq!(f32::from_le_bytes([out[0], out[1], out[2], out[3]]), 0.25);
        assert_relative_eq!(f32::from_le_bytes([out[4], out[5], out[6], out[7]]), -0.5);
    }

    #[test]
    fn decode_ignores_trailing_partial_unit() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_ne_bytes());
        bytes.extend_from_slice(&(-0.75f32).to_ne_bytes());
        bytes.push(0xAB);

        let mut samples = Vec::new();
        decode_units(&bytes, &mut samples);
        assert_eq!(samples, vec![0.5, -0.75]);
    }
}
