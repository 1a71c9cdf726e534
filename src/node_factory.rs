// src/node_factory.rs

use std::collections::BTreeMap;

use crate::graph::NodeInstance;
use crate::state::ParamInfo;

/// Identifier for a node type (oscillator, mixer, output).
pub type NodeTypeId = u32;

/// Metadata describing a node type.
///
/// Used by the UI to:
/// - Show available nodes in a palette
/// - Display parameter controls
///
/// and by the engine to clamp incoming parameter values.
#[derive(Debug, Clone)]
pub struct NodeTypeInfo {
    pub type_id: NodeTypeId,
    pub name: String,
    pub category: String,
    pub parameters: Vec<ParamInfo>,
}

impl NodeTypeInfo {
    pub fn new(type_id: NodeTypeId, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            type_id,
            name: name.into(),
            category: category.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamInfo) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn find_param(&self, id: u32) -> Option<&ParamInfo> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

/// A factory capable of creating fresh node instances.
///
/// This is only used on the editing thread.
pub trait NodeFactory {
    /// Create one node instance
    fn create(&self) -> NodeInstance;
}

/// Convenience factory wrapping a constructor function.
pub struct SimpleNodeFactory<F>
where
    F: Fn() -> NodeInstance,
{
    create_fn: F,
}

impl<F> SimpleNodeFactory<F>
where
    F: Fn() -> NodeInstance,
{
    pub fn new(create_fn: F) -> Self {
        Self { create_fn }
    }
}

impl<F> NodeFactory for SimpleNodeFactory<F>
where
    F: Fn() -> NodeInstance,
{
    fn create(&self) -> NodeInstance {
        (self.create_fn)()
    }
}

struct RegistryEntry {
    info: NodeTypeInfo,
    factory: Box<dyn NodeFactory + Send>,
}

/// All node types the engine can instantiate, keyed by type id.
#[derive(Default)]
pub struct NodeRegistry {
    entries: BTreeMap<NodeTypeId, RegistryEntry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type. A later registration replaces an earlier one.
    pub fn register<F>(&mut self, info: NodeTypeInfo, factory: F)
    where
        F: NodeFactory + Send + 'static,
    {
        let type_id = info.type_id;
        self.entries.insert(
            type_id,
            RegistryEntry {
                info,
                factory: Box::new(factory),
            },
        );
    }

    pub fn get_factory(&self, type_id: NodeTypeId) -> Option<&dyn NodeFactory> {
        self.entries
            .get(&type_id)
            .map(|e| e.factory.as_ref() as &dyn NodeFactory)
    }

    pub fn get_info(&self, type_id: NodeTypeId) -> Option<&NodeTypeInfo> {
        self.entries.get(&type_id).map(|e| &e.info)
    }

    /// All registered types in id order.
    pub fn node_types(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.entries.values().map(|e| &e.info)
    }
}
