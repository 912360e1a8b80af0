//! The editable network and its evaluation pipeline.
//!
//! A [`Network`] owns the graph, the placed components and the frequency
//! registry. Edits go through the methods in `editing`; [`Network::evaluate`]
//! rebuilds the spanning forest when the topology changed, rewrites the
//! per-slot parameters, and solves every slot. [`SharedNetwork`] puts the
//! whole thing behind one lock for multi-threaded use.

mod config;
mod editing;
mod shared;
mod snapshot;
mod state;

pub use config::{EvalStats, NetworkConfig};
pub use shared::SharedNetwork;
pub use snapshot::{BranchSnapshot, NetworkSnapshot};
pub use state::{ComponentNode, Network};
