//! Steps module — identifiers, the dependency gate, progress and the
//! per-step teaching text.

pub mod content;
pub mod graph;
pub mod progress;
pub mod step;
