// Summation node: reconciles input periods and adds them sample by sample.

use crate::audio_buffer::{Frame, SampleBuffer};
use crate::error::ConfigError;
use crate::node::{Node, RecalcContext};
use crate::period::reconcile;
use crate::state::ParamId;

use super::params;

/// How an input of length `n` is placed into the common length `L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixMode {
    /// Read at `k * n / L` with interpolation: one input cycle spans `L`.
    #[default]
    Stretch,

    /// Read at `k mod n`: the input repeats `L / n` times, keeping its pitch.
    Tile,
}

impl MixMode {
    pub fn from_param(value: f32) -> Option<Self> {
        match value.round() as i32 {
            0 => Some(MixMode::Stretch),
            1 => Some(MixMode::Tile),
            _ => None,
        }
    }

    pub fn as_param(self) -> f32 {
        match self {
            MixMode::Stretch => 0.0,
            MixMode::Tile => 1.0,
        }
    }
}

/// Sum `inputs` into `output` over their reconciled length, then scale.
///
/// No renormalisation or clipping happens here; headroom is up to the
/// upstream volumes and overflow is clamped at export.
pub fn mix_inputs(
    inputs: &[&SampleBuffer],
    mode: MixMode,
    gain: f32,
    output: &mut SampleBuffer,
) -> Result<(), ConfigError> {
    let len = reconcile(inputs.iter().map(|b| b.len()))?;
    output.resize(len)?;

    let target = len as f64;
    for k in 0..len {
        let mut acc = Frame::SILENCE;
        for input in inputs.iter().filter(|b| !b.is_empty()) {
            acc += match mode {
                MixMode::Stretch => {
                    let scale = input.len() as f64 / target;
                    input.read_interpolated(k as f64 * scale)
                }
                MixMode::Tile => input.read(k),
            };
        }
        let out = acc * gain;
        output.write(k, out.left, out.right);
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════
// Mixer Node
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixerNode {
    mode: MixMode,
}

impl MixerNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: MixMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn mode(&self) -> MixMode {
        self.mode
    }
}

impl Node for MixerNode {
    fn recalculate(
        &mut self,
        _ctx: &RecalcContext,
        inputs: &[&SampleBuffer],
        output: &mut SampleBuffer,
    ) -> Result<(), ConfigError> {
        mix_inputs(inputs, self.mode, 1.0, output)
    }

    fn set_param(&mut self, param_id: ParamId, value: f32) -> bool {
        match (param_id, MixMode::from_param(value)) {
            (params::MIX_MODE, Some(mode)) => {
                self.mode = mode;
                true
            }
            _ => false,
        }
    }

    fn param(&self, param_id: ParamId) -> Option<f32> {
        (param_id == params::MIX_MODE).then(|| self.mode.as_param())
    }
}
