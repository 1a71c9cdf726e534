// src/state/mod.rs
//
// Editing-side state: parameter metadata and batch commands.
//
// The UI collaborator describes edits with these types; the engine applies
// them on the editing thread and then recalculates once.

mod command;
mod param_info;

pub use command::*;
pub use param_info::*;
