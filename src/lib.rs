// src/lib.rs
//
// Library entry point for Rust, C ABI (native shell) and wasm consumers.

mod audio_buffer;
mod buffer_handoff;
mod config;
mod engine;
mod error;
mod graph;
mod node;
mod node_factory;
mod period;
mod playback;
mod position;
mod state;

pub mod nodes;
pub mod wav;

pub mod ffi;

#[cfg(feature = "web")]
mod wasm;

// Re-export key types for Rust consumers
pub use audio_buffer::{BUFFER_CAPACITY, Frame, SampleBuffer};
pub use buffer_handoff::{BufferHandoff, PublishedBuffer};
pub use config::{DEFAULT_EXPORT_LOOPS, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE, EngineConfig};
pub use engine::Engine;
pub use error::{ConfigError, ExportError, GraphError, NodeFault, RecalcError};
pub use graph::{Graph, GraphNode, NodeId, NodeInstance};
pub use node::{Node, NodeState, RecalcContext};
pub use node_factory::{NodeFactory, NodeRegistry, NodeTypeId, NodeTypeInfo, SimpleNodeFactory};
pub use nodes::{MixMode, Waveform, register_standard_nodes};
pub use period::{gcd, lcm, period_len, reconcile};
pub use playback::Playback;
pub use position::PlaybackPosition;
pub use state::{Command, CommandResult, ParamId, ParamInfo, ParamUnit};
