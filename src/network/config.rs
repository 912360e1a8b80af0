//! Network configuration and instrumentation counters.

use crate::frequency::FREQUENCY_EPSILON;
use crate::graph::DropConvention;
use crate::solver::DEFAULT_PIVOT_TOLERANCE;
use crate::DEFAULT_MERGE_RADIUS;

/// Configuration for a [`Network`](super::Network).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkConfig {
    /// Distance within which two component terminals snap together.
    pub merge_radius: f64,
    /// Smallest acceptable pivot magnitude after row equilibration.
    pub pivot_tolerance: f64,
    /// Two angular frequencies closer than this share a registry slot.
    pub frequency_epsilon: f64,
    /// How branch voltage drops are derived from the phasors.
    pub drop_convention: DropConvention,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            merge_radius: DEFAULT_MERGE_RADIUS,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            frequency_epsilon: FREQUENCY_EPSILON,
            drop_convention: DropConvention::default(),
        }
    }
}

impl NetworkConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the terminal snapping radius.
    pub fn with_merge_radius(mut self, merge_radius: f64) -> Self {
        self.merge_radius = merge_radius;
        self
    }

    /// Set the pivot tolerance.
    ///
    /// Raising it makes near-singular systems report as indeterminate
    /// instead of producing huge currents.
    pub fn with_pivot_tolerance(mut self, pivot_tolerance: f64) -> Self {
        self.pivot_tolerance = pivot_tolerance;
        self
    }

    /// Set the frequency matching tolerance.
    ///
    /// Zero asks for exact matching; negative and NaN values are treated
    /// the same way.
    pub fn with_frequency_epsilon(mut self, frequency_epsilon: f64) -> Self {
        self.frequency_epsilon = frequency_epsilon.max(0.0);
        self
    }

    /// Set the voltage drop convention.
    pub fn with_drop_convention(mut self, drop_convention: DropConvention) -> Self {
        self.drop_convention = drop_convention;
        self
    }
}

/// Counters describing what [`Network::evaluate`](super::Network::evaluate)
/// has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Calls that ran the pipeline
    pub evaluations: u64,
    /// Calls that returned early because nothing was dirty
    pub skipped: u64,
    /// Per-slot eliminations attempted
    pub solves: u64,
    /// Per-slot eliminations that failed
    pub failed_solves: u64,
    /// Spanning forest rebuilds
    pub rebuilds: u64,
}
