//! Owned copies of the solved network.

use num_complex::Complex64;

use crate::graph::{ComponentId, DropConvention};
use crate::solver::projector;

/// Solved phasors of one component's branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSnapshot {
    pub component: ComponentId,
    pub class: &'static str,
    pub impedance: Vec<Complex64>,
    pub source_voltage: Vec<Complex64>,
    /// Current through the component; for current sources the driven current
    pub current: Vec<Complex64>,
    /// `Z·I` of the branch itself
    pub impedance_drop: Vec<Complex64>,
}

/// Immutable view of a solved network.
///
/// Taken under the network lock and sampled afterwards without it, so an
/// audio or preview thread never observes a half-edited graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSnapshot {
    pub angular_frequencies: Vec<f64>,
    pub valid: bool,
    pub drop_convention: DropConvention,
    pub branches: Vec<BranchSnapshot>,
}

impl NetworkSnapshot {
    pub fn branch(&self, id: ComponentId) -> Option<&BranchSnapshot> {
        self.branches.iter().find(|b| b.component == id)
    }

    /// Instantaneous current through a component.
    pub fn current_at(&self, id: ComponentId, t: f64) -> Option<f64> {
        let branch = self.branch(id)?;
        Some(projector::project(&branch.current, &self.angular_frequencies, t))
    }

    /// Instantaneous voltage drop across a component.
    pub fn drop_at(&self, id: ComponentId, t: f64) -> Option<f64> {
        let branch = self.branch(id)?;
        let omegas = &self.angular_frequencies;
        let source = projector::project(&branch.source_voltage, omegas, t);
        let ir = projector::project(&branch.impedance_drop, omegas, t);
        Some(match self.drop_convention {
            DropConvention::SourceOverride if source != 0.0 => -source,
            DropConvention::SourceOverride => ir,
            DropConvention::Full => ir - source,
        })
    }

    /// Sample a component's current at `count` instants spaced `dt` apart.
    pub fn sample_current(&self, id: ComponentId, start: f64, dt: f64, count: usize) -> Option<Vec<f64>> {
        let branch = self.branch(id)?;
        Some(
            (0..count)
                .map(|n| projector::project(&branch.current, &self.angular_frequencies, start + dt * n as f64))
                .collect(),
        )
    }
}
