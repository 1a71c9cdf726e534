//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { tilesynth_init, TileSynth, node_oscillator, node_mixer, param_freq } from './tilesynth.js';
//!
//! await init();
//! tilesynth_init();
//!
//! const synth = new TileSynth();
//! const a = synth.add_node(node_oscillator());
//! const b = synth.add_node(node_oscillator());
//! synth.set_param(b, param_freq(), 660);
//! const mix = synth.add_node(node_mixer());
//! synth.connect(a, mix);
//! synth.connect(b, mix);
//! synth.connect(mix, synth.output_node());
//! synth.recalculate();
//!
//! // In the AudioWorklet's process():
//! synth.render(interleaved);
//!
//! // Download
//! const wav = synth.export_wav();
//! ```

use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::graph::NodeId;
use crate::playback::Playback;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn tilesynth_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration for creating an engine.
#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct TileSynthConfig {
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Frames per AudioWorklet callback (usually 128).
    pub frame_size: u32,
    /// Times the loop is repeated in an exported file.
    pub export_loops: u32,
}

#[wasm_bindgen]
impl TileSynthConfig {
    /// Create a new configuration with default values.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with custom values.
    pub fn with_values(sample_rate: u32, frame_size: u32, export_loops: u32) -> Self {
        Self {
            sample_rate,
            frame_size,
            export_loops,
        }
    }
}

impl Default for TileSynthConfig {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            sample_rate: cfg.sample_rate,
            frame_size: cfg.frame_size as u32,
            export_loops: cfg.export_loops,
        }
    }
}

impl From<TileSynthConfig> for EngineConfig {
    fn from(c: TileSynthConfig) -> Self {
        EngineConfig::with_values(c.sample_rate, c.frame_size as usize, c.export_loops)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Synth
// ═══════════════════════════════════════════════════════════════════════════

/// Loop synthesizer: editing operations plus a playback cursor.
#[wasm_bindgen]
pub struct TileSynth {
    engine: Engine,
    playback: Playback,
}

#[wasm_bindgen]
impl TileSynth {
    #[wasm_bindgen(constructor)]
    pub fn new() -> TileSynth {
        Self::new_with_config(TileSynthConfig::default())
    }

    pub fn new_with_config(config: TileSynthConfig) -> TileSynth {
        let engine = Engine::new(config.into());
        let playback = engine.playback();
        TileSynth { engine, playback }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph
    // ─────────────────────────────────────────────────────────────────────────

    /// Id of the output node.
    pub fn output_node(&self) -> u32 {
        self.engine.output_node().0
    }

    /// Add a node of a registered type. Returns `u32::MAX` on failure.
    pub fn add_node(&mut self, type_id: u32) -> u32 {
        match self.engine.add_node(type_id) {
            Ok(id) => id.0,
            Err(e) => {
                log::warn!("add_node: {}", e);
                u32::MAX
            }
        }
    }

    pub fn remove_node(&mut self, node_id: u32) -> bool {
        ok_or_log("remove_node", self.engine.remove_node(NodeId(node_id)))
    }

    pub fn connect(&mut self, child: u32, parent: u32) -> bool {
        ok_or_log("connect", self.engine.connect(NodeId(child), NodeId(parent)))
    }

    pub fn disconnect(&mut self, child: u32, parent: u32) -> bool {
        ok_or_log("disconnect", self.engine.disconnect(NodeId(child), NodeId(parent)))
    }

    /// Set a parameter. Out-of-range values are clamped.
    pub fn set_param(&mut self, node_id: u32, param_id: u32, value: f32) -> bool {
        ok_or_log(
            "set_param",
            self.engine.set_param(NodeId(node_id), param_id, value),
        )
    }

    /// Current value of a parameter, or NaN if the node or param is unknown.
    pub fn get_param(&self, node_id: u32, param_id: u32) -> f32 {
        self.engine
            .param(NodeId(node_id), param_id)
            .unwrap_or(f32::NAN)
    }

    /// Current value of a parameter formatted with its unit, or an empty
    /// string if the node or param is unknown.
    pub fn param_text(&self, node_id: u32, param_id: u32) -> String {
        self.engine
            .param_text(NodeId(node_id), param_id)
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> u32 {
        self.engine.graph().len() as u32
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recalculation
    // ─────────────────────────────────────────────────────────────────────────

    /// Regenerate the loop. Returns the number of nodes that fell back to
    /// silence.
    pub fn recalculate(&mut self) -> u32 {
        match self.engine.recalculate() {
            Ok(()) => 0,
            Err(e) => e.faults.len() as u32,
        }
    }

    /// Length of the published loop in samples per channel.
    pub fn output_len(&self) -> u32 {
        self.engine.output().buffer.len() as u32
    }

    /// Copy of the published left channel.
    pub fn output_left(&self) -> Vec<f32> {
        self.engine.output().buffer.left().to_vec()
    }

    /// Copy of the published right channel.
    pub fn output_right(&self) -> Vec<f32> {
        self.engine.output().buffer.right().to_vec()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────────────────────

    /// Render interleaved stereo into `output`: [L0, R0, L1, R1, ...].
    pub fn render(&mut self, output: &mut [f32]) {
        self.playback.render(output);
    }

    /// Render into separate channel arrays (AudioWorklet layout).
    pub fn render_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.playback.render_planar(left, right);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    /// Recalculate and return the loop as 16-bit stereo WAV bytes.
    pub fn export_wav(&mut self) -> Vec<u8> {
        let mut bytes = Vec::new();
        if let Err(e) = self.engine.export_wav(&mut bytes) {
            log::error!("export_wav: {}", e);
            bytes.clear();
        }
        bytes
    }

    /// Recalculate and return the left channel as 16-bit mono WAV bytes.
    pub fn export_wav_mono(&mut self) -> Vec<u8> {
        let mut bytes = Vec::new();
        if let Err(e) = self.engine.export_wav_mono(&mut bytes) {
            log::error!("export_wav_mono: {}", e);
            bytes.clear();
        }
        bytes
    }
}

impl Default for TileSynth {
    fn default() -> Self {
        Self::new()
    }
}

fn ok_or_log<E: std::fmt::Display>(op: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("{}: {}", op, e);
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Node Type Constants
// ═══════════════════════════════════════════════════════════════════════════

/// Oscillator node type.
#[wasm_bindgen]
pub fn node_oscillator() -> u32 {
    crate::nodes::node_types::OSCILLATOR
}

/// Mixer node type.
#[wasm_bindgen]
pub fn node_mixer() -> u32 {
    crate::nodes::node_types::MIXER
}

/// Output node type.
#[wasm_bindgen]
pub fn node_output() -> u32 {
    crate::nodes::node_types::OUTPUT
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameter ID Constants
// ═══════════════════════════════════════════════════════════════════════════

/// Frequency parameter ID (oscillator).
#[wasm_bindgen]
pub fn param_freq() -> u32 {
    crate::nodes::params::FREQ
}

/// Volume parameter ID (oscillator).
#[wasm_bindgen]
pub fn param_volume() -> u32 {
    crate::nodes::params::VOLUME
}

/// Pan parameter ID (oscillator).
#[wasm_bindgen]
pub fn param_pan() -> u32 {
    crate::nodes::params::PAN
}

/// Waveform parameter ID (oscillator): 0 sine, 1 saw, 2 square.
#[wasm_bindgen]
pub fn param_waveform() -> u32 {
    crate::nodes::params::WAVEFORM
}

/// Placement parameter ID (mixer): 0 stretch, 1 tile.
#[wasm_bindgen]
pub fn param_mix_mode() -> u32 {
    crate::nodes::params::MIX_MODE
}

/// Master gain parameter ID (output).
#[wasm_bindgen]
pub fn param_gain() -> u32 {
    crate::nodes::params::GAIN
}
