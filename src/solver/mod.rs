//! Branch-current solver.
//!
//! This module turns the network graph into per-frequency branch currents.
//!
//! ## Formulation
//!
//! The unknowns are one complex current per branch. A depth-first spanning
//! forest yields the incidence matrix `A` (branch × non-ground vertex) and a
//! fundamental cycle matrix `B` (branch × independent cycle). At every
//! simulated angular frequency the system
//!
//! ```text
//! Aᵀ·i       = j      (Kirchhoff current law, j = injected vertex currents)
//! Bᵀ·(Z∘i)   = Bᵀ·e   (Kirchhoff voltage law, e = branch source voltages)
//! ```
//!
//! is assembled and reduced by Gaussian elimination. Time-domain values are
//! recovered by summing the phasors, and node potentials by propagating
//! branch voltage drops breadth-first.

pub mod gauss;
pub mod potential;
pub mod projector;
mod spanning;
mod system;

pub use potential::reconstruct_potentials;
pub use spanning::{Topology, Visit};
pub use system::LinearSystem;

/// Default pivot threshold after row equilibration.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-10;
