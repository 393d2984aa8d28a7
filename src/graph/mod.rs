//! Facility graph: structural validation and traversal queries

pub mod model;

pub use model::{GraphError, GraphModel, TopologicalOrder};
