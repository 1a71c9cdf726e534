// src/position.rs

use crate::audio_buffer::{Frame, SampleBuffer};

/// Fractional read cursor into a [`SampleBuffer`].
///
/// Left and right are tracked separately so the channels may run at
/// different rates. Positions are kept wrapped to the buffer length to
/// avoid losing precision over long playback.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackPosition {
    left: f64,
    right: f64,
}

impl PlaybackPosition {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.right
    }

    #[inline]
    pub fn reset(&mut self) {
        self.left = 0.0;
        self.right = 0.0;
    }

    /// Read the buffer at the current cursor without moving it.
    #[inline]
    pub fn sample(&self, buffer: &SampleBuffer) -> Frame {
        let left = buffer.read_interpolated(self.left).left;
        let right = buffer.read_interpolated(self.right).right;
        Frame::new(left, right)
    }

    /// Advance each channel and wrap to `len`.
    #[inline]
    pub fn advance(&mut self, left_step: f64, right_step: f64, len: usize) {
        self.left += left_step;
        self.right += right_step;
        if len > 0 {
            let len = len as f64;
            self.left = self.left.rem_euclid(len);
            self.right = self.right.rem_euclid(len);
        } else {
            self.reset();
        }
    }

    /// Read the current frame, then step both channels by `step`.
    #[inline]
    pub fn next_frame(&mut self, buffer: &SampleBuffer, step: f64) -> Frame {
        let frame = self.sample(buffer);
        self.advance(step, step, buffer.len());
        frame
    }
}
