// src/engine.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use crate::buffer_handoff::{BufferHandoff, PublishedBuffer};
use crate::config::EngineConfig;
use crate::error::{ExportError, GraphError, RecalcError};
use crate::graph::{Graph, NodeId, NodeInstance};
use crate::node_factory::{NodeRegistry, NodeTypeId};
use crate::nodes::{MixMode, MixerNode, OscillatorNode, Waveform, params, register_standard_nodes};
use crate::playback::Playback;
use crate::state::{Command, CommandResult, ParamId, ParamInfo};
use crate::wav;

/// Editing-side engine.
///
/// Owns the graph and the node registry, and publishes every finished
/// output buffer to the audio thread through a [`BufferHandoff`].
/// Everything here runs on the editing thread; only [`Playback`] runs on
/// the audio thread.
pub struct Engine {
    graph: Graph,
    registry: NodeRegistry,
    handoff: Arc<BufferHandoff>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut registry = NodeRegistry::new();
        register_standard_nodes(&mut registry);

        info!(
            "engine: created ({} Hz, {} node types)",
            config.sample_rate,
            registry.node_types().count()
        );

        Self {
            graph: Graph::new(config.sample_rate),
            registry,
            handoff: Arc::new(BufferHandoff::new()),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    #[inline]
    pub fn output_node(&self) -> NodeId {
        self.graph.output_node()
    }

    // ═══════════════════════════════════════════════════════════════
    // Topology
    // ═══════════════════════════════════════════════════════════════

    /// Create a node of a registered type.
    pub fn add_node(&mut self, type_id: NodeTypeId) -> Result<NodeId, GraphError> {
        let factory = self
            .registry
            .get_factory(type_id)
            .ok_or(GraphError::UnknownNodeType(type_id))?;
        self.graph.add_node(factory)
    }

    pub fn add_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f32,
        volume: f32,
        pan: f32,
    ) -> Result<NodeId, GraphError> {
        let osc = OscillatorNode::new()
            .with_waveform(waveform)
            .with_frequency(frequency)
            .with_volume(volume)
            .with_pan(pan);
        self.graph.add_instance(NodeInstance::Oscillator(osc))
    }

    pub fn add_mixer(&mut self, mode: MixMode) -> Result<NodeId, GraphError> {
        self.graph
            .add_instance(NodeInstance::Mixer(MixerNode::new().with_mode(mode)))
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.graph.remove_node(id).map(|_| ())
    }

    pub fn connect(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        self.graph.connect(child, parent)
    }

    pub fn disconnect(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        self.graph.disconnect(child, parent)
    }

    // ═══════════════════════════════════════════════════════════════
    // Parameters
    // ═══════════════════════════════════════════════════════════════

    /// Set a parameter, clamped to the range its node type declares.
    ///
    /// Frequencies are stored as given and checked on recalculation.
    pub fn set_param(&mut self, id: NodeId, param_id: ParamId, value: f32) -> Result<(), GraphError> {
        let value = self.param_info(id, param_id)?.clamp(value);
        self.graph.set_param(id, param_id, value)
    }

    /// Declared metadata for one parameter of a node.
    pub fn param_info(&self, id: NodeId, param_id: ParamId) -> Result<&ParamInfo, GraphError> {
        let type_id = self
            .graph
            .get(id)
            .ok_or(GraphError::UnknownNode(id))?
            .instance
            .type_id();
        let info = self
            .registry
            .get_info(type_id)
            .ok_or(GraphError::UnknownNodeType(type_id))?;
        info.find_param(param_id).ok_or(GraphError::UnknownParam {
            node: id,
            param: param_id,
        })
    }

    pub fn set_frequency(&mut self, id: NodeId, frequency: f32) -> Result<(), GraphError> {
        self.set_param(id, params::FREQ, frequency)
    }

    pub fn set_volume(&mut self, id: NodeId, volume: f32) -> Result<(), GraphError> {
        self.set_param(id, params::VOLUME, volume)
    }

    pub fn set_pan(&mut self, id: NodeId, pan: f32) -> Result<(), GraphError> {
        self.set_param(id, params::PAN, pan)
    }

    pub fn set_waveform(&mut self, id: NodeId, waveform: Waveform) -> Result<(), GraphError> {
        self.graph.set_waveform(id, waveform)
    }

    pub fn set_mix_mode(&mut self, id: NodeId, mode: MixMode) -> Result<(), GraphError> {
        self.set_param(id, params::MIX_MODE, mode.as_param())
    }

    pub fn set_master_gain(&mut self, gain: f32) -> Result<(), GraphError> {
        let output = self.graph.output_node();
        self.set_param(output, params::GAIN, gain)
    }

    pub fn param(&self, id: NodeId, param_id: ParamId) -> Option<f32> {
        self.graph.param(id, param_id)
    }

    /// Current value of a parameter formatted with its unit, e.g. "440.00 Hz".
    pub fn param_text(&self, id: NodeId, param_id: ParamId) -> Option<String> {
        let info = self.param_info(id, param_id).ok()?;
        self.param(id, param_id).map(|value| info.format(value))
    }

    // ═══════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════

    /// Apply one edit without recalculating.
    pub fn apply(&mut self, command: Command) -> CommandResult {
        let result = match command {
            Command::AddNode { type_id } => self
                .add_node(type_id)
                .map(|node_id| CommandResult::NodeCreated { node_id }),
            Command::RemoveNode { node_id } => self.remove_node(node_id).map(|_| CommandResult::Ok),
            Command::Connect { child, parent } => {
                self.connect(child, parent).map(|_| CommandResult::Ok)
            }
            Command::Disconnect { child, parent } => {
                self.disconnect(child, parent).map(|_| CommandResult::Ok)
            }
            Command::SetParam {
                node_id,
                param_id,
                value,
            } => self
                .set_param(node_id, param_id, value)
                .map(|_| CommandResult::Ok),
            Command::SetWaveform { node_id, waveform } => self
                .set_waveform(node_id, waveform)
                .map(|_| CommandResult::Ok),
        };

        result.unwrap_or_else(|e| {
            warn!("engine: command rejected: {}", e);
            CommandResult::Error {
                message: e.to_string(),
            }
        })
    }

    /// Apply a batch of edits in order, then recalculate once.
    ///
    /// A rejected command does not stop the rest of the batch.
    pub fn apply_batch<I>(&mut self, commands: I) -> (Vec<CommandResult>, Result<(), RecalcError>)
    where
        I: IntoIterator<Item = Command>,
    {
        let results: Vec<CommandResult> = commands.into_iter().map(|c| self.apply(c)).collect();
        (results, self.recalculate())
    }

    // ═══════════════════════════════════════════════════════════════
    // Recalculation & publication
    // ═══════════════════════════════════════════════════════════════

    /// Regenerate the graph and publish the output buffer.
    ///
    /// The output is published even when some nodes failed; those nodes
    /// contribute silence and are listed in the error.
    pub fn recalculate(&mut self) -> Result<(), RecalcError> {
        let faults = self.graph.recalculate();
        let buffer = self.graph.output_buffer().clone();
        let len = buffer.len();
        let generation = self.handoff.publish(buffer);

        info!(
            "engine: generation {} published, loop length {} samples",
            generation, len
        );

        if faults.is_empty() {
            Ok(())
        } else {
            Err(RecalcError { faults })
        }
    }

    /// The most recently published output.
    pub fn output(&self) -> Arc<PublishedBuffer> {
        self.handoff.snapshot()
    }

    pub fn handoff(&self) -> Arc<BufferHandoff> {
        Arc::clone(&self.handoff)
    }

    /// A playback cursor for the audio thread.
    pub fn playback(&self) -> Playback {
        Playback::new(self.handoff())
    }

    // ═══════════════════════════════════════════════════════════════
    // Export
    // ═══════════════════════════════════════════════════════════════

    /// Recalculate the graph into its working buffers without publishing.
    ///
    /// Playback keeps following the last published loop.
    fn render_for_export(&mut self) {
        let faults = self.graph.recalculate();
        if !faults.is_empty() {
            warn!("export: {}", RecalcError { faults });
        }
    }

    /// Recalculate and write the output loop as a 16-bit stereo WAV.
    ///
    /// Node faults do not abort the export; the faulty nodes are silent.
    /// The result is not published, so a running playback cursor is
    /// left where it is.
    pub fn export_wav<W: Write>(&mut self, sink: &mut W) -> Result<(), ExportError> {
        self.render_for_export();

        let buffer = self.graph.output_buffer();
        wav::write_stereo(
            sink,
            buffer.len(),
            buffer.left(),
            buffer.right(),
            self.config.sample_rate,
            self.config.export_loops,
        )?;
        sink.flush()?;

        info!(
            "export: wrote {} frames x {} loop(s)",
            buffer.len(),
            self.config.export_loops.max(1)
        );
        Ok(())
    }

    /// Like [`Engine::export_wav`], but writes the left channel as mono.
    pub fn export_wav_mono<W: Write>(&mut self, sink: &mut W) -> Result<(), ExportError> {
        self.render_for_export();

        let buffer = self.graph.output_buffer();
        wav::write_mono(
            sink,
            buffer.left(),
            self.config.sample_rate,
            self.config.export_loops,
        )?;
        sink.flush()?;

        info!("export: wrote {} mono frames", buffer.len());
        Ok(())
    }

    /// Recalculate and write the output loop to a file.
    ///
    /// `None` means no destination was chosen; nothing is written.
    pub fn save_wav(&mut self, path: Option<&Path>) -> Result<(), ExportError> {
        let path = path.ok_or(ExportError::NoDestination)?;

        let result = File::create(path)
            .map_err(ExportError::from)
            .and_then(|file| self.export_wav(&mut BufWriter::new(file)));

        if let Err(e) = &result {
            error!("export: {}: {}", path.display(), e);
        }
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::node_types;
    use std::io::Cursor;

    const SR: u32 = 44_100;

    fn engine() -> Engine {
        Engine::new(EngineConfig::with_values(SR, 256, 1))
    }

    #[test]
    fn empty_graph_publishes_silence() {
        let mut engine = engine();
        engine.recalculate().unwrap();

        let out = engine.output();
        assert_eq!(out.generation, 1);
        assert!(out.buffer.is_empty());

        let mut playback = engine.playback();
        let mut block = [1.0_f32; 8];
        playback.render(&mut block);
        assert_eq!(block, [0.0; 8]);
    }

    #[test]
    fn single_oscillator_reaches_output() {
        let mut engine = engine();
        let osc = engine.add_oscillator(Waveform::Square, 441.0, 0.5, 0.0).unwrap();
        engine.connect(osc, engine.output_node()).unwrap();
        engine.recalculate().unwrap();

        let out = engine.output();
        assert_eq!(out.buffer.len(), 100);
        assert_eq!(out.buffer.left()[0], 0.5);
        assert_eq!(out.buffer.right()[99], -0.5);
    }

    #[test]
    fn mixer_reconciles_to_lcm() {
        let mut engine = engine();
        let a = engine.add_oscillator(Waveform::Sine, 441.0, 0.5, 0.0).unwrap();
        let b = engine.add_oscillator(Waveform::Saw, 300.0, 0.5, 0.0).unwrap();
        let mix = engine.add_mixer(MixMode::Tile).unwrap();
        engine.connect(a, mix).unwrap();
        engine.connect(b, mix).unwrap();
        engine.connect(mix, engine.output_node()).unwrap();
        engine.recalculate().unwrap();

        // 100 and 147 samples
        assert_eq!(engine.graph().buffer(mix).unwrap().len(), 14_700);
        assert_eq!(engine.output().buffer.len(), 14_700);
    }

    #[test]
    fn set_param_clamps_to_declared_range() {
        let mut engine = engine();
        let osc = engine.add_node(node_types::OSCILLATOR).unwrap();

        engine.set_pan(osc, 3.0).unwrap();
        assert_eq!(engine.param(osc, params::PAN), Some(1.0));

        engine.set_volume(osc, 10.0).unwrap();
        assert_eq!(engine.param(osc, params::VOLUME), Some(10.0));
        engine.set_volume(osc, -1.0).unwrap();
        assert_eq!(engine.param(osc, params::VOLUME), Some(0.0));

        engine.set_master_gain(8.0).unwrap();
        assert_eq!(engine.param(engine.output_node(), params::GAIN), Some(8.0));

        assert_eq!(
            engine.set_param(osc, 99, 1.0),
            Err(GraphError::UnknownParam { node: osc, param: 99 })
        );
    }

    #[test]
    fn param_text_uses_declared_unit() {
        let mut engine = engine();
        let osc = engine.add_oscillator(Waveform::Sine, 440.0, 0.5, 0.0).unwrap();

        assert_eq!(engine.param_text(osc, params::FREQ).as_deref(), Some("440.00 Hz"));
        assert_eq!(engine.param_text(osc, params::WAVEFORM).as_deref(), Some("0"));
        assert_eq!(engine.param_text(osc, 99), None);
        assert_eq!(engine.param_text(NodeId(999), params::FREQ), None);
    }

    #[test]
    fn invalid_frequency_is_reported_and_silent() {
        let mut engine = engine();
        let good = engine.add_oscillator(Waveform::Sine, 441.0, 0.5, 0.0).unwrap();
        let bad = engine.add_oscillator(Waveform::Sine, 441.0, 0.5, 0.0).unwrap();
        let mix = engine.add_mixer(MixMode::Stretch).unwrap();
        engine.connect(good, mix).unwrap();
        engine.connect(bad, mix).unwrap();
        engine.connect(mix, engine.output_node()).unwrap();

        engine.set_frequency(bad, 0.0).unwrap();
        let err = engine.recalculate().unwrap_err();
        assert_eq!(err.faults.len(), 1);
        assert_eq!(err.faults[0].node, bad);

        // the healthy branch still plays
        assert_eq!(engine.output().buffer.len(), 100);
    }

    #[test]
    fn batch_applies_in_order_then_recalculates() {
        let mut engine = engine();
        let output = engine.output_node();
        let (results, recalc) = engine.apply_batch([
            Command::AddNode {
                type_id: node_types::OSCILLATOR,
            },
            Command::AddNode { type_id: 12345 },
        ]);
        recalc.unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[1].is_ok());

        let CommandResult::NodeCreated { node_id } = results[0] else {
            panic!("expected a node, got {:?}", results[0]);
        };

        let (results, recalc) = engine.apply_batch([
            Command::SetParam {
                node_id,
                param_id: params::FREQ,
                value: 441.0,
            },
            Command::SetWaveform {
                node_id,
                waveform: Waveform::Saw,
            },
            Command::Connect {
                child: node_id,
                parent: output,
            },
            Command::Connect {
                child: output,
                parent: node_id,
            },
        ]);
        recalc.unwrap();
        assert!(results[..3].iter().all(CommandResult::is_ok));
        assert!(!results[3].is_ok());
        assert_eq!(engine.output().buffer.len(), 100);
        assert_eq!(engine.output().generation, 2);
    }

    #[test]
    fn playback_restarts_after_edit() {
        let mut engine = engine();
        let osc = engine.add_oscillator(Waveform::Saw, 441.0, 1.0, 0.0).unwrap();
        engine.connect(osc, engine.output_node()).unwrap();
        engine.recalculate().unwrap();

        let mut playback = engine.playback();
        let mut block = [0.0_f32; 20];
        playback.render(&mut block);
        assert_eq!(playback.position().left(), 10.0);

        engine.set_volume(osc, 0.5).unwrap();
        engine.recalculate().unwrap();
        playback.render(&mut block);
        assert_eq!(block[0], -0.5);
        assert_eq!(playback.position().left(), 10.0);
    }

    #[test]
    fn export_matches_published_loop() {
        let mut engine = Engine::new(EngineConfig::with_values(SR, 256, 2));
        let osc = engine.add_oscillator(Waveform::Sine, 441.0, 0.8, -0.5).unwrap();
        engine.connect(osc, engine.output_node()).unwrap();

        let mut bytes = Vec::new();
        engine.export_wav(&mut bytes).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, SR);
        assert_eq!(reader.duration(), 200);

        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        let out = engine.graph().output_buffer();
        for k in 0..100 {
            assert_eq!(samples[2 * k], wav::quantize(out.left()[k]));
            assert_eq!(samples[2 * k + 1], wav::quantize(out.right()[k]));
            // second loop repeats the first
            assert_eq!(samples[2 * k], samples[200 + 2 * k]);
        }
    }

    #[test]
    fn export_leaves_playback_cursor_alone() {
        let mut engine = engine();
        let osc = engine.add_oscillator(Waveform::Saw, 441.0, 1.0, 0.0).unwrap();
        engine.connect(osc, engine.output_node()).unwrap();
        engine.recalculate().unwrap();

        let mut playback = engine.playback();
        let mut block = [0.0_f32; 60];
        playback.render(&mut block);
        assert_eq!(playback.position().left(), 30.0);

        let mut bytes = Vec::new();
        engine.export_wav(&mut bytes).unwrap();
        engine.export_wav_mono(&mut bytes).unwrap();
        assert_eq!(engine.output().generation, 1);

        let mut next = [0.0_f32; 2];
        playback.render(&mut next);
        assert_eq!(playback.position().left(), 31.0);
        assert_eq!(next[0], engine.output().buffer.left()[30]);
    }

    #[test]
    fn mono_export_writes_left_channel() {
        let mut engine = engine();
        let osc = engine.add_oscillator(Waveform::Square, 882.0, 0.5, -1.0).unwrap();
        engine.connect(osc, engine.output_node()).unwrap();

        let mut bytes = Vec::new();
        engine.export_wav_mono(&mut bytes).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.duration(), 50);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        let left = engine.graph().output_buffer().left();
        for (k, &s) in samples.iter().enumerate() {
            assert_eq!(s, wav::quantize(left[k]));
        }
    }

    #[test]
    fn save_wav_without_destination_writes_nothing() {
        let mut engine = engine();
        assert!(matches!(engine.save_wav(None), Err(ExportError::NoDestination)));
        assert_eq!(engine.output().generation, 0);
    }

    #[test]
    fn save_wav_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.wav");

        let mut engine = engine();
        let osc = engine.add_oscillator(Waveform::Square, 882.0, 0.5, 0.0).unwrap();
        engine.connect(osc, engine.output_node()).unwrap();
        engine.save_wav(Some(path.as_path())).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 50);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 44 + 50 * 4);
    }

    #[test]
    fn save_wav_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("loop.wav");

        let mut engine = engine();
        assert!(matches!(engine.save_wav(Some(path.as_path())), Err(ExportError::Io(_))));
    }
}
