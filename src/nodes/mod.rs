// src/nodes/mod.rs
//
// Standard node types for the synthesizer.

mod mixer;
mod oscillators;
mod utility;

pub use mixer::*;
pub use oscillators::*;
pub use utility::*;

use crate::graph::NodeInstance;
use crate::node_factory::{NodeRegistry, NodeTypeInfo, SimpleNodeFactory};
use crate::state::{DisplayCurve, ParamInfo, ParamUnit};

// ═══════════════════════════════════════════════════════════════════
// Node Type IDs
// ═══════════════════════════════════════════════════════════════════

pub mod node_types {
    pub const OSCILLATOR: u32 = 1;

    pub const MIXER: u32 = 22;

    pub const OUTPUT: u32 = 100;
}

// ═══════════════════════════════════════════════════════════════════
// Parameter IDs (per-node-type)
// ═══════════════════════════════════════════════════════════════════

pub mod params {
    // Oscillator params
    pub const FREQ: u32 = 0;
    pub const VOLUME: u32 = 1;
    pub const PAN: u32 = 2;
    pub const WAVEFORM: u32 = 3;

    // Mixer params
    pub const MIX_MODE: u32 = 0;

    // Output params
    pub const GAIN: u32 = 0;
}

// ═══════════════════════════════════════════════════════════════════
// Registry Population
// ═══════════════════════════════════════════════════════════════════

/// Populate the registry with all standard node types.
pub fn register_standard_nodes(registry: &mut NodeRegistry) {
    registry.register(
        NodeTypeInfo::new(node_types::OSCILLATOR, "Oscillator", "Sources")
            .with_param(
                ParamInfo::new(params::FREQ, "Frequency")
                    .range(1.0, 20_000.0)
                    .default(DEFAULT_FREQUENCY)
                    .unit(ParamUnit::Hz)
                    .curve(DisplayCurve::Logarithmic)
                    .validated_on_recalc(),
            )
            .with_param(
                ParamInfo::new(params::VOLUME, "Volume")
                    .range(0.0, f32::MAX)
                    .default(DEFAULT_VOLUME)
                    .unit(ParamUnit::Gain),
            )
            .with_param(
                ParamInfo::new(params::PAN, "Pan")
                    .range(-1.0, 1.0)
                    .default(0.0)
                    .unit(ParamUnit::Pan)
                    .curve(DisplayCurve::Symmetric),
            )
            .with_param(
                ParamInfo::new(params::WAVEFORM, "Waveform")
                    .range(0.0, 2.0)
                    .default(Waveform::Sine.as_param())
                    .unit(ParamUnit::Choice)
                    .step(1.0),
            ),
        SimpleNodeFactory::new(|| NodeInstance::Oscillator(OscillatorNode::new())),
    );

    registry.register(
        NodeTypeInfo::new(node_types::MIXER, "Mixer", "Mixing").with_param(
            ParamInfo::new(params::MIX_MODE, "Placement")
                .range(0.0, 1.0)
                .default(MixMode::Stretch.as_param())
                .unit(ParamUnit::Choice)
                .step(1.0),
        ),
        SimpleNodeFactory::new(|| NodeInstance::Mixer(MixerNode::new())),
    );

    registry.register(
        NodeTypeInfo::new(node_types::OUTPUT, "Output", "Utility").with_param(
            ParamInfo::new(params::GAIN, "Master")
                .range(0.0, f32::MAX)
                .default(1.0)
                .unit(ParamUnit::Gain),
        ),
        SimpleNodeFactory::new(|| NodeInstance::Output(OutputNode::new())),
    );
}
