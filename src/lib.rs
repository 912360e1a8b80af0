//! # Phasor Core
//!
//! Steady-state solver for live-editable electrical networks.
//!
//! This library provides:
//! - An arena graph of circuit branches that can be split, merged and
//!   re-wired while the network is being edited
//! - A multi-frequency phasor solver built on a spanning forest and its
//!   fundamental cycle basis
//! - Time-domain projection of the solved phasors and per-island node
//!   potentials
//! - A line-oriented text format for saving and loading networks
//!
//! ## Architecture
//!
//! - [`graph`] - Vertex/edge arena and its mutation primitives
//! - [`frequency`] - Reference-counted registry of simulated frequencies
//! - [`components`] - Component models (wires, R, L, C, sources, ground)
//! - [`solver`] - Spanning forest, linear system, elimination, projection
//! - [`network`] - The editable network, evaluation, shared access
//! - [`persist`] - Save/load of networks as text
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! phasor loop.net --time 0.01 --potentials
//! ```
//!
//! ### Library
//!
//! ```
//! use phasor_core::components::{ComponentKind, ComponentSpec, DcVoltageSource, Resistor};
//! use phasor_core::graph::Point;
//! use phasor_core::Network;
//!
//! let mut net = Network::new();
//! let src = net.add_component(ComponentSpec::new(
//!     ComponentKind::DcVoltageSource(DcVoltageSource::new(10.0)),
//!     Point::new(0.0, 0.0),
//!     Point::new(0.0, 1.0),
//! ))?;
//! net.add_component(ComponentSpec::new(
//!     ComponentKind::Resistor(Resistor::new(20.0)),
//!     Point::new(0.0, 1.0),
//!     Point::new(0.0, 0.0),
//! ))?;
//! net.evaluate(false)?;
//! assert!((net.branch_current(src, 0.0)? - 0.5).abs() < 1e-9);
//! # Ok::<(), phasor_core::NetworkError>(())
//! ```
//!
//! ## Solution Method
//!
//! For each simulated angular frequency ω:
//!
//! 1. Write every component's impedance, source voltage and injected current
//!    into the graph
//! 2. Combine them with the incidence and cycle matrices of the spanning
//!    forest (rebuilt only after topology edits)
//! 3. Solve for one complex current per branch by Gaussian elimination
//!
//! A slot whose system is singular or inconsistent marks the whole network
//! invalid and reads back as zero current.

pub mod components;
pub mod error;
pub mod frequency;
pub mod graph;
pub mod network;
pub mod persist;
pub mod solver;

// Re-export main types for convenience
pub use error::{NetworkError, Result, SolveError};
pub use network::{ComponentNode, Network, NetworkConfig, NetworkSnapshot, SharedNetwork};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmNetwork;

/// Default radius within which component terminals snap together.
pub const DEFAULT_MERGE_RADIUS: f64 = 0.25;

/// Impedance standing in for an open circuit (capacitors at DC, current
/// source branches). Large enough to carry no meaningful current, finite so
/// the branch still closes its cycle.
pub const OPEN_CIRCUIT_IMPEDANCE: f64 = 1e9;
