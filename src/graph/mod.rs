//! Network graph representation.
//!
//! The [`Graph`] arena holds the vertices and edges the solver works on.
//! Components attach to it through edge handles; every structural edit of the
//! network ends up as one of the graph-level primitives defined here.

mod graph;
mod types;
mod validate;

pub use graph::{DropConvention, Edge, Graph, Vertex};
pub use types::*;
pub use validate::validate_graph;
