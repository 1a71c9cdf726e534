// src/node.rs

use crate::audio_buffer::SampleBuffer;
use crate::error::ConfigError;
use crate::state::ParamId;

/// Recalculation lifecycle of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Parameters or an upstream node changed since the last pass.
    #[default]
    Stale,

    /// Inside a recalculation pass, children first.
    Recalculating,

    /// Buffer is valid and safe to read.
    Fresh,
}

/// Context passed to nodes during recalculation.
#[derive(Debug, Clone, Copy)]
pub struct RecalcContext {
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl RecalcContext {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

/// Common contract for every node variant.
///
/// Nodes:
/// - do NOT know about graph topology
/// - do NOT publish anything to the audio thread
/// - ONLY regenerate their own buffer from their inputs
pub trait Node {
    /// Regenerate `output` from scratch.
    ///
    /// The graph guarantees every buffer in `inputs` is Fresh. On error the
    /// graph replaces `output` with silence.
    fn recalculate(
        &mut self,
        ctx: &RecalcContext,
        inputs: &[&SampleBuffer],
        output: &mut SampleBuffer,
    ) -> Result<(), ConfigError>;

    /// Set a parameter value. Returns `false` for an unknown parameter.
    fn set_param(&mut self, param_id: ParamId, value: f32) -> bool;

    /// Current value of a parameter.
    fn param(&self, param_id: ParamId) -> Option<f32>;

    /// Whether other nodes may be connected as inputs.
    fn accepts_inputs(&self) -> bool {
        true
    }
}
