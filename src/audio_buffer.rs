// src/audio_buffer.rs

use std::ops::{Add, AddAssign, Mul};

use crate::error::ConfigError;

/// Maximum samples per channel any node may hold.
pub const BUFFER_CAPACITY: usize = 1 << 20;

/// One stereo sample pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const SILENCE: Frame = Frame {
        left: 0.0,
        right: 0.0,
    };

    #[inline]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }
}

impl Add for Frame {
    type Output = Frame;

    #[inline]
    fn add(self, rhs: Frame) -> Frame {
        Frame::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl AddAssign for Frame {
    #[inline]
    fn add_assign(&mut self, rhs: Frame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    #[inline]
    fn mul(self, gain: f32) -> Frame {
        Frame::new(self.left * gain, self.right * gain)
    }
}

/// Dual-channel, wrap-around sample storage holding one loopable cycle.
///
/// The active length never exceeds [`BUFFER_CAPACITY`]. All indices wrap
/// modulo the active length, so a single period can be looped at fixed
/// pitch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SampleBuffer {
    /// An empty (silent) buffer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero-filled buffer of `len` samples per channel.
    pub fn with_len(len: usize) -> Result<Self, ConfigError> {
        let mut buffer = Self::new();
        buffer.resize(len)?;
        Ok(buffer)
    }

    /// Active length in samples per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Set the active length and zero every sample.
    ///
    /// Lengths above [`BUFFER_CAPACITY`] are rejected and leave the buffer
    /// silent.
    pub fn resize(&mut self, len: usize) -> Result<(), ConfigError> {
        if len > BUFFER_CAPACITY {
            self.clear();
            return Err(ConfigError::PeriodTooLong {
                length: len,
                capacity: BUFFER_CAPACITY,
            });
        }
        self.left.clear();
        self.right.clear();
        self.left.resize(len, 0.0);
        self.right.resize(len, 0.0);
        Ok(())
    }

    /// Drop to the degenerate silent buffer (`len == 0`).
    #[inline]
    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    /// Store a sample pair at `index mod len`. No-op on an empty buffer.
    #[inline]
    pub fn write(&mut self, index: usize, left: f32, right: f32) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = index % len;
        self.left[i] = left;
        self.right[i] = right;
    }

    /// Raw sample pair at `index mod len`. Silence on an empty buffer.
    #[inline]
    pub fn read(&self, index: usize) -> Frame {
        let len = self.len();
        if len == 0 {
            return Frame::SILENCE;
        }
        let i = index % len;
        Frame::new(self.left[i], self.right[i])
    }

    /// Linearly interpolated sample pair at fractional position `t`.
    ///
    /// `i = floor(t) mod len`, `j = (i + 1) mod len`, and each channel is
    /// `s[i] + frac * (s[j] - s[i])`. Reading past the end wraps to the
    /// start, and an empty buffer yields silence for any `t`.
    #[inline]
    pub fn read_interpolated(&self, t: f64) -> Frame {
        let len = self.len();
        if len == 0 || !t.is_finite() {
            return Frame::SILENCE;
        }
        let floor = t.floor();
        let frac = (t - floor) as f32;
        let i = floor.rem_euclid(len as f64) as usize % len;
        let j = (i + 1) % len;

        let left = self.left[i] + frac * (self.left[j] - self.left[i]);
        let right = self.right[i] + frac * (self.right[j] - self.right[i]);
        Frame::new(left, right)
    }

    #[inline]
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    #[inline]
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Largest absolute sample value across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::with_len(len).unwrap();
        for i in 0..len {
            buffer.write(i, i as f32, -(i as f32));
        }
        buffer
    }

    #[test]
    fn write_and_read_wrap_modulo_len() {
        let mut buffer = SampleBuffer::with_len(4).unwrap();
        buffer.write(5, 0.5, -0.5);
        assert_eq!(buffer.read(1), Frame::new(0.5, -0.5));
        assert_eq!(buffer.read(9), Frame::new(0.5, -0.5));
    }

    #[test]
    fn interpolates_between_neighbours() {
        let buffer = ramp(4);
        let f = buffer.read_interpolated(1.25);
        assert!((f.left - 1.25).abs() < 1e-6);
        assert!((f.right + 1.25).abs() < 1e-6);
    }

    #[test]
    fn interpolation_past_last_sample_averages_with_first() {
        let buffer = ramp(4);
        let f = buffer.read_interpolated(4.0 - 0.5);
        // halfway between sample 3 and sample 0
        assert!((f.left - 1.5).abs() < 1e-6);
        assert!((f.right + 1.5).abs() < 1e-6);
    }

    #[test]
    fn empty_buffer_reads_silence_for_any_position() {
        let buffer = SampleBuffer::new();
        for t in [0.0, 0.5, 17.3, 1e9] {
            assert_eq!(buffer.read_interpolated(t), Frame::SILENCE);
        }
        assert_eq!(buffer.read(3), Frame::SILENCE);
    }

    #[test]
    fn resize_past_capacity_is_rejected_and_silent() {
        let mut buffer = ramp(8);
        let err = buffer.resize(BUFFER_CAPACITY + 1).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PeriodTooLong {
                length: BUFFER_CAPACITY + 1,
                capacity: BUFFER_CAPACITY
            }
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn peak_spans_both_channels() {
        let mut buffer = SampleBuffer::with_len(2).unwrap();
        buffer.write(0, 0.25, -0.75);
        buffer.write(1, 0.5, 0.0);
        assert_eq!(buffer.peak(), 0.75);
    }
}
