// One-cycle oscillator: a leaf node that renders exactly one period of its
// waveform so the buffer can be looped at a fixed pitch.

use std::f64::consts::TAU;

use crate::audio_buffer::SampleBuffer;
use crate::error::ConfigError;
use crate::node::{Node, RecalcContext};
use crate::period::period_len;
use crate::state::ParamId;

use super::params;

pub const DEFAULT_FREQUENCY: f32 = 440.0;
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
}

impl Waveform {
    /// Map a parameter value (0, 1, 2) to a waveform.
    pub fn from_param(value: f32) -> Option<Self> {
        match value.round() as i32 {
            0 => Some(Waveform::Sine),
            1 => Some(Waveform::Saw),
            2 => Some(Waveform::Square),
            _ => None,
        }
    }

    pub fn as_param(self) -> f32 {
        match self {
            Waveform::Sine => 0.0,
            Waveform::Saw => 1.0,
            Waveform::Square => 2.0,
        }
    }

    /// Unit-amplitude value at sample `k` of an `n`-sample cycle.
    #[inline]
    pub fn sample(self, k: usize, n: usize) -> f32 {
        let phase = k as f64 / n as f64;
        match self {
            Waveform::Sine => (TAU * phase).sin() as f32,
            Waveform::Saw => (2.0 * phase - 1.0) as f32,
            // first half high, second half low
            Waveform::Square => {
                if 2 * k < n {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Left/right gains for a pan position in [-1, 1].
///
/// Center is `(1, 1)`; each extreme mutes the opposite channel.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
}

// ═══════════════════════════════════════════════════════════════════
// Oscillator Node
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorNode {
    waveform: Waveform,
    freq: f32,
    volume: f32,
    pan: f32,
}

impl OscillatorNode {
    pub fn new() -> Self {
        Self {
            waveform: Waveform::Sine,
            freq: DEFAULT_FREQUENCY,
            volume: DEFAULT_VOLUME,
            pan: 0.0,
        }
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_frequency(mut self, freq: f32) -> Self {
        self.freq = freq;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.set_volume(volume);
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.set_pan(pan);
        self
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[inline]
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Stored as given; non-positive values are reported on recalculation.
    #[inline]
    pub fn set_frequency(&mut self, freq: f32) {
        self.freq = freq;
    }

    #[inline]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.max(0.0) };
    }

    #[inline]
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = if pan.is_nan() { 0.0 } else { pan.clamp(-1.0, 1.0) };
    }
}

impl Default for OscillatorNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for OscillatorNode {
    fn recalculate(
        &mut self,
        ctx: &RecalcContext,
        _inputs: &[&SampleBuffer],
        output: &mut SampleBuffer,
    ) -> Result<(), ConfigError> {
        let n = period_len(self.freq, ctx.sample_rate)?;
        output.resize(n)?;

        let (left_gain, right_gain) = pan_gains(self.pan);
        for k in 0..n {
            let s = self.volume * self.waveform.sample(k, n);
            output.write(k, s * left_gain, s * right_gain);
        }

        Ok(())
    }

    fn set_param(&mut self, param_id: ParamId, value: f32) -> bool {
        match param_id {
            params::FREQ => self.set_frequency(value),
            params::VOLUME => self.set_volume(value),
            params::PAN => self.set_pan(value),
            params::WAVEFORM => match Waveform::from_param(value) {
                Some(w) => self.waveform = w,
                None => return false,
            },
            _ => return false,
        }
        true
    }

    fn param(&self, param_id: ParamId) -> Option<f32> {
        match param_id {
            params::FREQ => Some(self.freq),
            params::VOLUME => Some(self.volume),
            params::PAN => Some(self.pan),
            params::WAVEFORM => Some(self.waveform.as_param()),
            _ => None,
        }
    }

    fn accepts_inputs(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44_100;

    fn render(osc: &mut OscillatorNode) -> SampleBuffer {
        let mut out = SampleBuffer::new();
        osc.recalculate(&RecalcContext::new(SR), &[], &mut out)
            .unwrap();
        out
    }

    #[test]
    fn buffer_holds_exactly_one_period() {
        let mut osc = OscillatorNode::new().with_frequency(441.0);
        assert_eq!(render(&mut osc).len(), 100);

        let mut osc = OscillatorNode::new().with_frequency(261.63);
        let expected = (SR as f64 / 261.63_f64).round() as usize;
        assert_eq!(render(&mut osc).len(), expected);
    }

    #[test]
    fn sine_quarter_points() {
        // 4-sample period
        let mut osc = OscillatorNode::new()
            .with_frequency(SR as f32 / 4.0)
            .with_volume(0.8);
        let out = render(&mut osc);
        assert_eq!(out.len(), 4);
        let expected = [0.0, 0.8, 0.0, -0.8];
        for (k, e) in expected.iter().enumerate() {
            assert!((out.read(k).left - e).abs() < 1e-6, "k={k}");
            assert!((out.read(k).right - e).abs() < 1e-6, "k={k}");
        }
    }

    #[test]
    fn sine_is_phase_continuous_across_the_loop() {
        let mut osc = OscillatorNode::new().with_frequency(441.0);
        let out = render(&mut osc);
        let n = out.len() as f64;
        let start = out.read_interpolated(0.0);
        let one_period_later = out.read_interpolated(n);
        assert_eq!(start, one_period_later);
    }

    #[test]
    fn square_is_high_then_low() {
        let mut osc = OscillatorNode::new()
            .with_waveform(Waveform::Square)
            .with_frequency(SR as f32 / 10.0)
            .with_volume(0.5);
        let out = render(&mut osc);
        assert_eq!(out.len(), 10);
        assert!(out.left()[..5].iter().all(|&s| s == 0.5));
        assert!(out.left()[5..].iter().all(|&s| s == -0.5));
    }

    #[test]
    fn saw_ramps_from_minus_volume() {
        let mut osc = OscillatorNode::new()
            .with_waveform(Waveform::Saw)
            .with_frequency(SR as f32 / 4.0)
            .with_volume(1.0);
        let out = render(&mut osc);
        assert_eq!(out.left(), &[-1.0, -0.5, 0.0, 0.5]);
    }

    #[test]
    fn pan_extremes_mute_opposite_channel() {
        assert_eq!(pan_gains(0.0), (1.0, 1.0));
        assert_eq!(pan_gains(-1.0), (1.0, 0.0));
        assert_eq!(pan_gains(1.0), (0.0, 1.0));

        let mut osc = OscillatorNode::new()
            .with_waveform(Waveform::Square)
            .with_frequency(SR as f32 / 4.0)
            .with_pan(1.0);
        let out = render(&mut osc);
        assert!(out.left().iter().all(|&s| s == 0.0));
        assert!(out.right().iter().any(|&s| s != 0.0));
    }

    #[test]
    fn non_positive_frequency_is_a_config_error() {
        let mut osc = OscillatorNode::new().with_frequency(0.0);
        let mut out = SampleBuffer::new();
        let err = osc
            .recalculate(&RecalcContext::new(SR), &[], &mut out)
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidFrequency { frequency: 0.0 });
    }

    #[test]
    fn changing_params_regenerates_whole_buffer() {
        let mut osc = OscillatorNode::new().with_frequency(441.0);
        let first = render(&mut osc);
        assert!(osc.set_param(params::FREQ, 882.0));
        assert!(osc.set_param(params::WAVEFORM, Waveform::Saw.as_param()));
        let second = render(&mut osc);
        assert_eq!(second.len(), 50);
        assert_ne!(first.left()[..50], second.left()[..]);
    }

    #[test]
    fn unknown_param_and_waveform_are_rejected() {
        let mut osc = OscillatorNode::new();
        assert!(!osc.set_param(99, 1.0));
        assert!(!osc.set_param(params::WAVEFORM, 7.0));
        assert_eq!(osc.waveform(), Waveform::Sine);
    }
}
