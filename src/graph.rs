//! Synthesis graph: an arena of nodes with parent/child edges.
//!
//! The arena owns every node and its buffer. Handles ([`NodeId`]) are
//! stable for the lifetime of the graph and are never reused, so a stale
//! handle to a removed node simply fails to resolve. The child -> parent
//! link is a plain handle used for traversal only.
//!
//! Recalculation is a full post-order pass from the output node: every
//! reachable child is regenerated before its parent reads it.

use std::fmt;

use log::{debug, warn};

use crate::{
    audio_buffer::SampleBuffer,
    error::{ConfigError, GraphError, NodeFault},
    node::{Node, NodeState, RecalcContext},
    node_factory::{NodeFactory, NodeTypeId},
    nodes::{MixerNode, OscillatorNode, OutputNode, Waveform, node_types, params},
    state::ParamId,
};

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInstance {
    Oscillator(OscillatorNode),
    Mixer(MixerNode),
    Output(OutputNode),
}

impl NodeInstance {
    #[inline]
    fn as_node(&self) -> &dyn Node {
        match self {
            NodeInstance::Oscillator(n) => n,
            NodeInstance::Mixer(n) => n,
            NodeInstance::Output(n) => n,
        }
    }

    #[inline]
    fn as_node_mut(&mut self) -> &mut dyn Node {
        match self {
            NodeInstance::Oscillator(n) => n,
            NodeInstance::Mixer(n) => n,
            NodeInstance::Output(n) => n,
        }
    }

    #[inline]
    pub fn recalculate(
        &mut self,
        ctx: &RecalcContext,
        inputs: &[&SampleBuffer],
        output: &mut SampleBuffer,
    ) -> Result<(), ConfigError> {
        self.as_node_mut().recalculate(ctx, inputs, output)
    }

    #[inline]
    pub fn set_param(&mut self, param_id: ParamId, value: f32) -> bool {
        self.as_node_mut().set_param(param_id, value)
    }

    #[inline]
    pub fn param(&self, param_id: ParamId) -> Option<f32> {
        self.as_node().param(param_id)
    }

    #[inline]
    pub fn accepts_inputs(&self) -> bool {
        self.as_node().accepts_inputs()
    }

    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(self, NodeInstance::Output(_))
    }

    /// Registry type id of this variant.
    pub fn type_id(&self) -> NodeTypeId {
        match self {
            NodeInstance::Oscillator(_) => node_types::OSCILLATOR,
            NodeInstance::Mixer(_) => node_types::MIXER,
            NodeInstance::Output(_) => node_types::OUTPUT,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeInstance::Oscillator(_) => "oscillator",
            NodeInstance::Mixer(_) => "mixer",
            NodeInstance::Output(_) => "output",
        }
    }
}

/// One node in the graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub instance: NodeInstance,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub state: NodeState,
}

impl GraphNode {
    fn new(instance: NodeInstance) -> Self {
        Self {
            instance,
            children: Vec::new(),
            parent: None,
            state: NodeState::Stale,
        }
    }
}

/// The synthesis graph
pub struct Graph {
    slots: Vec<Option<GraphNode>>,
    buffers: Vec<SampleBuffer>,
    output_node: NodeId,
    sample_rate: u32,

    /// Post-order evaluation scratch (recomputed every pass)
    eval_order: Vec<usize>,
}

impl Graph {
    /// Create a graph holding only its output node.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            slots: vec![Some(GraphNode::new(NodeInstance::Output(OutputNode::new())))],
            buffers: vec![SampleBuffer::new()],
            output_node: NodeId(0),
            sample_rate,
            eval_order: Vec::new(),
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn output_node(&self) -> NodeId {
        self.output_node
    }

    /// Add a node created by `factory`.
    pub fn add_node(&mut self, factory: &dyn NodeFactory) -> Result<NodeId, GraphError> {
        self.add_instance(factory.create())
    }

    /// Add a node instance. Only one output node may exist.
    pub fn add_instance(&mut self, instance: NodeInstance) -> Result<NodeId, GraphError> {
        if instance.is_output() {
            return Err(GraphError::DuplicateOutput);
        }
        let id = NodeId(self.slots.len() as u32);
        debug!("graph: add {} {}", instance.kind_name(), id);
        self.slots.push(Some(GraphNode::new(instance)));
        self.buffers.push(SampleBuffer::new());
        Ok(id)
    }

    /// Remove a node. Its children stay in the arena, unconnected.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeInstance, GraphError> {
        if id == self.output_node {
            return Err(GraphError::CannotRemoveOutput);
        }
        let node = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::UnknownNode(id))?;

        if let Some(parent) = node.parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|&c| c != id);
            }
            self.mark_stale(parent);
        }
        for &child in &node.children {
            if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
        }
        self.buffers[id.index()].clear();

        debug!("graph: removed {} {}", node.instance.kind_name(), id);
        Ok(node.instance)
    }

    /// Make `child` an input of `parent`.
    ///
    /// Rejects edges that would give a node two parents, feed the output
    /// node into something, give a leaf node inputs, or close a cycle.
    pub fn connect(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        if child == parent {
            return Err(GraphError::SelfConnection(child));
        }
        let child_node = self.get(child).ok_or(GraphError::UnknownNode(child))?;
        let parent_node = self.get(parent).ok_or(GraphError::UnknownNode(parent))?;

        if child_node.instance.is_output() {
            return Err(GraphError::OutputHasParent);
        }
        if !parent_node.instance.accepts_inputs() {
            return Err(GraphError::NotAContainer(parent));
        }
        if let Some(existing) = child_node.parent {
            return Err(GraphError::AlreadyHasParent {
                child,
                parent: existing,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(GraphError::CycleDetected { child, parent });
        }

        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        self.mark_stale(parent);

        debug!("graph: connect {} -> {}", child, parent);
        Ok(())
    }

    /// Detach `child` from `parent`.
    pub fn disconnect(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
        let child_node = self.get(child).ok_or(GraphError::UnknownNode(child))?;
        if child_node.parent != Some(parent) {
            return Err(GraphError::NotConnected { child, parent });
        }

        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
        self.mark_stale(parent);

        debug!("graph: disconnect {} -> {}", child, parent);
        Ok(())
    }

    /// Whether `ancestor` is `node` or lies on the parent chain above it.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Mark `id` and everything downstream of it Stale.
    fn mark_stale(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            cursor = match self.get_mut(current) {
                Some(node) => {
                    node.state = NodeState::Stale;
                    node.parent
                }
                None => None,
            };
        }
    }

    /// Set a parameter on a node.
    pub fn set_param(&mut self, id: NodeId, param_id: ParamId, value: f32) -> Result<(), GraphError> {
        let node = self.get_mut(id).ok_or(GraphError::UnknownNode(id))?;
        if !node.instance.set_param(param_id, value) {
            return Err(GraphError::UnknownParam {
                node: id,
                param: param_id,
            });
        }
        self.mark_stale(id);
        Ok(())
    }

    /// Select the waveform of an oscillator node.
    pub fn set_waveform(&mut self, id: NodeId, waveform: Waveform) -> Result<(), GraphError> {
        let node = self.get_mut(id).ok_or(GraphError::UnknownNode(id))?;
        match &mut node.instance {
            NodeInstance::Oscillator(osc) => osc.set_waveform(waveform),
            _ => {
                return Err(GraphError::UnknownParam {
                    node: id,
                    param: params::WAVEFORM,
                });
            }
        }
        self.mark_stale(id);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&GraphNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Current parameter value of a node.
    pub fn param(&self, id: NodeId, param_id: ParamId) -> Option<f32> {
        self.get(id).and_then(|n| n.instance.param(param_id))
    }

    /// Recalculation state of a node.
    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.get(id).map(|n| n.state)
    }

    /// Buffer of a node, valid when its state is Fresh.
    pub fn buffer(&self, id: NodeId) -> Option<&SampleBuffer> {
        self.get(id).map(|_| &self.buffers[id.index()])
    }

    /// The output node's buffer.
    #[inline]
    pub fn output_buffer(&self) -> &SampleBuffer {
        &self.buffers[self.output_node.index()]
    }

    /// Live nodes in handle order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Number of live nodes, including the output node.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Regenerate every node reachable from the output, children first.
    ///
    /// A node that fails falls back to silence and is reported; the pass
    /// always runs to completion.
    pub fn recalculate(&mut self) -> Vec<NodeFault> {
        self.compute_eval_order();

        let ctx = RecalcContext::new(self.sample_rate);
        let mut faults = Vec::new();

        // Use index iteration to avoid cloning eval_order
        for i in 0..self.eval_order.len() {
            let idx = self.eval_order[i];
            if let Err(error) = self.recalculate_node(idx, &ctx) {
                let node = NodeId(idx as u32);
                warn!("recalculate: {} fell back to silence: {}", node, error);
                faults.push(NodeFault { node, error });
            }
        }

        faults
    }

    /// Iterative post-order walk from the output node.
    fn compute_eval_order(&mut self) {
        self.eval_order.clear();
        let mut stack = vec![(self.output_node, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                self.eval_order.push(id.index());
                continue;
            }
            let Some(node) = self.get_mut(id) else {
                continue;
            };
            node.state = NodeState::Recalculating;
            stack.push((id, true));
            for &child in node.children.iter().rev() {
                stack.push((child, false));
            }
        }
    }

    fn recalculate_node(&mut self, idx: usize, ctx: &RecalcContext) -> Result<(), ConfigError> {
        let mut output = std::mem::take(&mut self.buffers[idx]);

        let result = match self.slots[idx].as_mut() {
            Some(node) => {
                let inputs: Vec<&SampleBuffer> = node
                    .children
                    .iter()
                    .map(|c| &self.buffers[c.index()])
                    .collect();
                let result = node.instance.recalculate(ctx, &inputs, &mut output);
                node.state = NodeState::Fresh;
                result
            }
            None => Ok(()),
        };

        if result.is_err() {
            output.clear();
        }
        self.buffers[idx] = output;
        result
    }
}
