//! Uncompressed PCM RIFF/WAVE encoding.
//!
//! Layout (all integers little-endian, written field by field):
//!
//! ```text
//! "RIFF" <u32 36 + data_size> "WAVE"
//! "fmt " <u32 16> <u16 1 = PCM> <u16 channels> <u32 sample_rate>
//!        <u32 byte_rate> <u16 block_align> <u16 bits_per_sample>
//! "data" <u32 data_size> <interleaved i16 samples>
//! ```
//!
//! Encoding is a pure transform of a finished buffer; it never touches the
//! live graph.

use std::io::{self, Write};

/// Bits per exported sample.
pub const BITS_PER_SAMPLE: u16 = 16;

const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;
/// Size of everything after the RIFF size field, minus the sample data.
const HEADER_TAIL: u32 = 36;

/// Header fields derived from channel count, sample rate and frame count.
///
/// Only constructed through [`WavHeader::new`], which rejects values whose
/// derived sizes do not fit the 32-bit RIFF fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    data_size: u32,
}

impl WavHeader {
    pub fn new(channels: u16, sample_rate: u32, frames: u32) -> io::Result<Self> {
        let block_align = u32::from(channels) * u32::from(BYTES_PER_SAMPLE);
        let byte_rate = sample_rate
            .checked_mul(block_align)
            .ok_or_else(|| too_large("sample rate"))?;
        let data_size = frames
            .checked_mul(block_align)
            .filter(|size| size.checked_add(HEADER_TAIL).is_some())
            .ok_or_else(|| too_large("audio data"))?;

        Ok(Self {
            channels,
            sample_rate,
            byte_rate,
            data_size,
        })
    }

    #[inline]
    pub fn block_align(&self) -> u16 {
        self.channels * BYTES_PER_SAMPLE
    }

    #[inline]
    pub fn byte_rate(&self) -> u32 {
        self.byte_rate
    }

    #[inline]
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    #[inline]
    pub fn riff_size(&self) -> u32 {
        HEADER_TAIL + self.data_size
    }

    /// Write the 44-byte header.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"RIFF")?;
        w.write_all(&self.riff_size().to_le_bytes())?;
        w.write_all(b"WAVE")?;

        w.write_all(b"fmt ")?;
        w.write_all(&FMT_CHUNK_SIZE.to_le_bytes())?;
        w.write_all(&PCM_FORMAT.to_le_bytes())?;
        w.write_all(&self.channels.to_le_bytes())?;
        w.write_all(&self.sample_rate.to_le_bytes())?;
        w.write_all(&self.byte_rate.to_le_bytes())?;
        w.write_all(&self.block_align().to_le_bytes())?;
        w.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

        w.write_all(b"data")?;
        w.write_all(&self.data_size.to_le_bytes())?;
        Ok(())
    }
}

fn too_large(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{what} too large for a WAV file"),
    )
}

/// Convert a float sample to 16-bit PCM.
///
/// `round(sample * 32767)` clamped to the i16 range; NaN becomes 0.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * 32767.0)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

fn frame_count(samples: usize, loops: u32) -> io::Result<u32> {
    u32::try_from(samples)
        .ok()
        .and_then(|n| n.checked_mul(loops.max(1)))
        .ok_or_else(|| too_large("audio data"))
}

/// Write a stereo file, repeating the buffer `loops` times (at least once).
///
/// Only the first `sample_count` samples of each channel are used.
pub fn write_stereo<W: Write>(
    w: &mut W,
    sample_count: usize,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
    loops: u32,
) -> io::Result<()> {
    let n = sample_count.min(left.len()).min(right.len());
    let header = WavHeader::new(2, sample_rate, frame_count(n, loops)?)?;
    header.write_to(w)?;

    let mut data = Vec::with_capacity(n * 4);
    for (&l, &r) in left[..n].iter().zip(&right[..n]) {
        data.extend_from_slice(&quantize(l).to_le_bytes());
        data.extend_from_slice(&quantize(r).to_le_bytes());
    }
    for _ in 0..loops.max(1) {
        w.write_all(&data)?;
    }
    Ok(())
}

/// Write a mono file from a single channel.
pub fn write_mono<W: Write>(
    w: &mut W,
    samples: &[f32],
    sample_rate: u32,
    loops: u32,
) -> io::Result<()> {
    let header = WavHeader::new(1, sample_rate, frame_count(samples.len(), loops)?)?;
    header.write_to(w)?;

    let data: Vec<u8> = samples
        .iter()
        .flat_map(|&s| quantize(s).to_le_bytes())
        .collect();
    for _ in 0..loops.max(1) {
        w.write_all(&data)?;
    }
    Ok(())
}

/// Encode a stereo buffer to WAV bytes.
pub fn encode(
    sample_count: usize,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(44 + sample_count * 4);
    write_stereo(&mut bytes, sample_count, left, right, sample_rate, 1)?;
    Ok(bytes)
}

/// Encode a single channel to mono WAV bytes.
pub fn encode_mono(samples: &[f32], sample_rate: u32) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(44 + samples.len() * 2);
    write_mono(&mut bytes, samples, sample_rate, 1)?;
    Ok(bytes)
}
