//! Deterministic WAV encoding.
//!
//! The container layout is the fixed 44-byte RIFF/WAVE header (PCM format
//! tag 1, 16-bit little-endian samples) with `RIFF` size = file length − 8
//! and `data` size = payload bytes. Float samples are clamped to [-1, 1]
//! and scaled by 0x8000 when negative and 0x7FFF otherwise; this asymmetric
//! mapping is part of the external contract and keeps 1.0 / -1.0 exactly at
//! 0x7FFF / 0x8000.

use std::io::{self, Write};

/// WAV format parameters.
#[derive(Debug, Clone, Copy)]
pub struct WavFormat {
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl WavFormat {
    /// Creates a mono format.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
        }
    }

    /// Creates a stereo format.
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            channels: 2,
            sample_rate,
        }
    }

    fn block_align(&self) -> u16 {
        self.channels * 2
    }

    fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Converts one float sample to a 16-bit PCM value.
#[inline]
fn to_i16(sample: f64) -> i16 {
    let clipped = sample.clamp(-1.0, 1.0);
    if clipped < 0.0 {
        (clipped * 32768.0).round() as i16
    } else {
        (clipped * 32767.0).round() as i16
    }
}

/// Converts mono f64 samples to 16-bit little-endian PCM bytes.
pub fn samples_to_pcm16(samples: &[f64]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        pcm.extend_from_slice(&to_i16(sample).to_le_bytes());
    }
    pcm
}

/// Converts separate left/right channels to interleaved 16-bit PCM bytes.
pub fn stereo_to_pcm16(left: &[f64], right: &[f64]) -> Vec<u8> {
    let len = left.len().min(right.len());
    let mut pcm = Vec::with_capacity(len * 4);
    for i in 0..len {
        pcm.extend_from_slice(&to_i16(left[i]).to_le_bytes());
        pcm.extend_from_slice(&to_i16(right[i]).to_le_bytes());
    }
    pcm
}

/// Writes a complete WAV file to a writer.
pub fn write_wav<W: Write>(writer: &mut W, format: &WavFormat, pcm_data: &[u8]) -> io::Result<()> {
    let data_size = pcm_data.len() as u32;
    // RIFF size field counts everything after itself: 36 header bytes plus
    // the payload.
    let file_size = 36 + data_size;

    writer.write_all(b"RIFF")?;
    writer.write_all(&file_size.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?;
    writer.write_all(&format.channels.to_le_bytes())?;
    writer.write_all(&format.sample_rate.to_le_bytes())?;
    writer.write_all(&format.byte_rate().to_le_bytes())?;
    writer.write_all(&format.block_align().to_le_bytes())?;
    writer.write_all(&16u16.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(pcm_data)?;

    Ok(())
}

/// Writes a WAV file to a byte vector.
pub fn write_wav_to_vec(format: &WavFormat, pcm_data: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(44 + pcm_data.len());
    write_wav(&mut buffer, format, pcm_data).expect("writing to Vec cannot fail");
    buffer
}

/// Extracts the `data` chunk payload from a WAV file buffer.
pub fn extract_pcm_data(wav_data: &[u8]) -> Option<&[u8]> {
    if wav_data.len() < 44 || &wav_data[0..4] != b"RIFF" || &wav_data[8..12] != b"WAVE" {
        return None;
    }

    let mut pos = 12;
    while pos + 8 <= wav_data.len() {
        let chunk_id = &wav_data[pos..pos + 4];
        let chunk_size = u32::from_le_bytes([
            wav_data[pos + 4],
            wav_data[pos + 5],
            wav_data[pos + 6],
            wav_data[pos + 7],
        ]) as usize;

        if chunk_id == b"data" {
            let start = pos + 8;
            let end = start + chunk_size;
            if end <= wav_data.len() {
                return Some(&wav_data[start..end]);
            }
        }

        pos += 8 + chunk_size + (chunk_size & 1);
    }

    None
}

/// Result of encoding one render to WAV.
#[derive(Debug)]
pub struct WavResult {
    /// Complete WAV file bytes.
    pub wav_data: Vec<u8>,
    /// BLAKE3 hash of the PCM payload only.
    pub pcm_hash: String,
    /// Whether the output is stereo.
    pub is_stereo: bool,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per channel.
    pub num_samples: usize,
}

impl WavResult {
    /// Encodes mono samples.
    pub fn from_mono(samples: &[f64], sample_rate: u32) -> Self {
        let pcm = samples_to_pcm16(samples);
        let pcm_hash = blake3::hash(&pcm).to_hex().to_string();
        let wav_data = write_wav_to_vec(&WavFormat::mono(sample_rate), &pcm);
        Self {
            wav_data,
            pcm_hash,
            is_stereo: false,
            sample_rate,
            num_samples: samples.len(),
        }
    }

    /// Encodes stereo samples.
    pub fn from_stereo(left: &[f64], right: &[f64], sample_rate: u32) -> Self {
        let pcm = stereo_to_pcm16(left, right);
        let pcm_hash = blake3::hash(&pcm).to_hex().to_string();
        let wav_data = write_wav_to_vec(&WavFormat::stereo(sample_rate), &pcm);
        Self {
            wav_data,
            pcm_hash,
            is_stereo: true,
            sample_rate,
            num_samples: left.len().min(right.len()),
        }
    }

    /// Render length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.num_samples as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_layout_is_canonical() {
        let result = WavResult::from_mono(&[0.0; 100], 44100);
        let wav = &result.wav_data;

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        // RIFF size = file length - 8.
        let riff_size = u32::from_le_bytes(wav[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, wav.len() - 8);

        // Format tag 1, mono, 16-bit.
        assert_eq!(u16::from_le_bytes(wav[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(wav[22..24].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(wav[34..36].try_into().unwrap()), 16);

        // Byte rate and block align for mono 16-bit.
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 44100 * 2);
        assert_eq!(u16::from_le_bytes(wav[32..34].try_into().unwrap()), 2);
    }

    #[test]
    fn zero_samples_produce_zero_payload() {
        let samples = vec![0.0; 64];
        let result = WavResult::from_stereo(&samples, &samples, 22050);
        let pcm = extract_pcm_data(&result.wav_data).unwrap();

        assert_eq!(pcm.len(), 64 * 2 * 2);
        assert!(pcm.iter().all(|&b| b == 0));
    }

    #[test]
    fn full_scale_maps_to_exact_extremes() {
        let pcm = samples_to_pcm16(&[1.0, -1.0]);
        // 0x7FFF then 0x8000, little-endian.
        assert_eq!(pcm, vec![0xFF, 0x7F, 0x00, 0x80]);
    }

    #[test]
    fn out_of_range_samples_are_clipped() {
        let pcm = samples_to_pcm16(&[2.0, -3.0]);
        assert_eq!(pcm, vec![0xFF, 0x7F, 0x00, 0x80]);
    }

    #[test]
    fn stereo_interleaves_left_then_right() {
        let pcm = stereo_to_pcm16(&[1.0], &[-1.0]);
        assert_eq!(pcm, vec![0xFF, 0x7F, 0x00, 0x80]);
    }

    #[test]
    fn pcm_hash_is_stable_hex() {
        let result = WavResult::from_mono(&[0.25, -0.5, 0.75], 44100);
        assert_eq!(result.pcm_hash.len(), 64);
        assert!(result.pcm_hash.chars().all(|c| c.is_ascii_hexdigit()));

        let again = WavResult::from_mono(&[0.25, -0.5, 0.75], 44100);
        assert_eq!(result.pcm_hash, again.pcm_hash);
    }

    #[test]
    fn extract_rejects_garbage() {
        assert!(extract_pcm_data(b"not a wav").is_none());
        assert!(extract_pcm_data(&[0u8; 100]).is_none());
    }
}
