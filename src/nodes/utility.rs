// Utility nodes (output)

use crate::audio_buffer::SampleBuffer;
use crate::error::ConfigError;
use crate::node::{Node, RecalcContext};
use crate::state::ParamId;

use super::mixer::{MixMode, mix_inputs};
use super::params;

// ═══════════════════════════════════════════════════════════════════
// Output Node (final destination)
// ═══════════════════════════════════════════════════════════════════

/// Terminal node. Its buffer is what playback and export read.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputNode {
    master: f32,
}

impl OutputNode {
    pub fn new() -> Self {
        Self { master: 1.0 }
    }

    #[inline]
    pub fn master(&self) -> f32 {
        self.master
    }
}

impl Default for OutputNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for OutputNode {
    fn recalculate(
        &mut self,
        _ctx: &RecalcContext,
        inputs: &[&SampleBuffer],
        output: &mut SampleBuffer,
    ) -> Result<(), ConfigError> {
        mix_inputs(inputs, MixMode::Stretch, self.master, output)
    }

    fn set_param(&mut self, param_id: ParamId, value: f32) -> bool {
        match param_id {
            params::GAIN => {
                self.master = if value.is_nan() { 1.0 } else { value.max(0.0) };
                true
            }
            _ => false,
        }
    }

    fn param(&self, param_id: ParamId) -> Option<f32> {
        (param_id == params::GAIN).then_some(self.master)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_buffer::Frame;

    #[test]
    fn single_input_passes_through_with_master_gain() {
        let mut input = SampleBuffer::with_len(3).unwrap();
        input.write(0, 0.5, -0.5);
        input.write(1, 0.25, 0.125);

        let mut node = OutputNode::new();
        node.set_param(params::GAIN, 2.0);

        let mut out = SampleBuffer::new();
        node.recalculate(&RecalcContext::new(44_100), &[&input], &mut out)
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.read(0), Frame::new(1.0, -1.0));
        assert_eq!(out.read(1), Frame::new(0.5, 0.25));
        assert_eq!(out.read(2), Frame::SILENCE);
    }

    #[test]
    fn no_inputs_is_silence() {
        let mut out = SampleBuffer::with_len(8).unwrap();
        OutputNode::new()
            .recalculate(&RecalcContext::new(44_100), &[], &mut out)
            .unwrap();
        assert!(out.is_empty());
    }
}
