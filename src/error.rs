// src/error.rs
//
// Error taxonomy for the synthesis core.

use thiserror::Error;

use crate::graph::NodeId;
use crate::state::ParamId;

/// A node could not produce a valid buffer from its current parameters.
///
/// The node falls back to silence (`len == 0`) and the error is reported
/// to whoever triggered the recalculation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frequency must be a positive finite number of Hz, got {frequency}")]
    InvalidFrequency { frequency: f32 },

    #[error("period of {length} samples exceeds the buffer capacity of {capacity}")]
    PeriodTooLong { length: usize, capacity: usize },

    #[error("reconciled period overflowed while folding input lengths")]
    PeriodOverflow,
}

/// Structural edits rejected at the edge/node boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("connecting {child} under {parent} would create a cycle")]
    CycleDetected { child: NodeId, parent: NodeId },

    #[error("node {0} cannot be connected to itself")]
    SelfConnection(NodeId),

    #[error("node {child} is already connected to parent {parent}")]
    AlreadyHasParent { child: NodeId, parent: NodeId },

    #[error("node {0} does not accept inputs")]
    NotAContainer(NodeId),

    #[error("the output node cannot feed another node")]
    OutputHasParent,

    #[error("the graph already has an output node")]
    DuplicateOutput,

    #[error("the output node cannot be removed")]
    CannotRemoveOutput,

    #[error("node {child} is not connected to {parent}")]
    NotConnected { child: NodeId, parent: NodeId },

    #[error("unknown node type {0}")]
    UnknownNodeType(u32),

    #[error("node {node} has no parameter {param}")]
    UnknownParam { node: NodeId, param: ParamId },
}

/// One node's failure during a recalculation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFault {
    pub node: NodeId,
    pub error: ConfigError,
}

/// A recalculation pass finished, but some nodes fell back to silence.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} node(s) failed to recalculate", .faults.len())]
pub struct RecalcError {
    pub faults: Vec<NodeFault>,
}

/// WAV export failure. Graph state and playback are unaffected.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no export destination was chosen")]
    NoDestination,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
