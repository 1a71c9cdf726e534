// Commands from the editing collaborator to the engine.
//
// Parameters and topology change only through discrete batches of these
// commands; a batch is applied in order and followed by one full
// recalculation.

use super::ParamId;
use crate::graph::NodeId;
use crate::nodes::Waveform;

/// A single graph edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ═══════════════════════════════════════════
    // Topology
    // ═══════════════════════════════════════════
    /// Create a node of the given type.
    AddNode { type_id: u32 },

    /// Remove a node. Its children are left unconnected.
    RemoveNode { node_id: NodeId },

    /// Make `child` an input of `parent`.
    Connect { child: NodeId, parent: NodeId },

    /// Detach `child` from `parent`.
    Disconnect { child: NodeId, parent: NodeId },

    // ═══════════════════════════════════════════
    // Parameters
    // ═══════════════════════════════════════════
    /// Set a parameter value.
    SetParam {
        node_id: NodeId,
        param_id: ParamId,
        value: f32,
    },

    /// Select an oscillator waveform.
    SetWaveform { node_id: NodeId, waveform: Waveform },
}

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Command succeeded.
    Ok,

    /// Command succeeded and created a node.
    NodeCreated { node_id: NodeId },

    /// Command failed.
    Error { message: String },
}

impl CommandResult {
    #[inline]
    pub fn is_ok(&self) -> bool {
        !matches!(self, CommandResult::Error { .. })
    }
}
