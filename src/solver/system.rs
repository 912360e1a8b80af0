//! Combined incidence/cycle linear system.

use num_complex::Complex64;

use super::spanning::Topology;
use crate::error::Result;
use crate::graph::Graph;

/// Branch-current system for one frequency slot.
///
/// Stored as a `(E+1) × (N+C)` matrix: one row per branch plus a constants
/// row, one column per equation. The first `N` columns are Kirchhoff current
/// law at each non-ground vertex (the incidence sub-matrix), the remaining
/// `C` columns are Kirchhoff voltage law per independent cycle (cycle matrix
/// scaled by branch impedance). The last row holds injected vertex currents
/// and the net source voltage of each cycle.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    /// Number of branches (unknowns)
    pub branches: usize,
    /// Number of vertex (KCL) equations
    pub vertex_equations: usize,
    /// Number of cycle (KVL) equations
    pub cycle_equations: usize,
    data: Vec<Complex64>,
}

impl LinearSystem {
    /// Create the system for a topology with its structural block filled in.
    pub fn new(topology: &Topology) -> Self {
        let branches = topology.num_branches();
        let vertex_equations = topology.vertices.len();
        let cycle_equations = topology.num_cycles;
        let mut system = Self {
            branches,
            vertex_equations,
            cycle_equations,
            data: vec![Complex64::default(); (branches + 1) * (vertex_equations + cycle_equations)],
        };
        for row in 0..branches {
            for col in 0..vertex_equations {
                system.set(row, col, Complex64::new(topology.incidence(row, col) as f64, 0.0));
            }
        }
        system
    }

    /// Build the full system for one slot.
    pub fn assemble(topology: &Topology, graph: &Graph, slot: usize) -> Result<Self> {
        let mut system = Self::new(topology);
        system.load_slot(topology, graph, slot)?;
        Ok(system)
    }

    /// Number of equations (columns).
    pub fn equations(&self) -> usize {
        self.vertex_equations + self.cycle_equations
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.equations() + col]
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: Complex64) {
        let equations = self.equations();
        self.data[row * equations + col] = value;
    }

    /// Patch the parameter-dependent blocks for one frequency slot.
    ///
    /// The incidence block only depends on topology and is left untouched.
    pub fn load_slot(&mut self, topology: &Topology, graph: &Graph, slot: usize) -> Result<()> {
        let mut impedance = Vec::with_capacity(self.branches);
        let mut source = Vec::with_capacity(self.branches);
        for &id in &topology.edges {
            let edge = graph.edge(id)?;
            impedance.push(edge.impedance[slot]);
            source.push(edge.source_voltage[slot]);
        }

        let constants = self.branches;
        for (col, &vertex) in topology.vertices.iter().enumerate() {
            let injected = graph.vertex(vertex)?.input_current[slot];
            self.set(constants, col, injected);
        }

        for cycle in 0..self.cycle_equations {
            let col = self.vertex_equations + cycle;
            let mut net_source = Complex64::default();
            for row in 0..self.branches {
                let sign = topology.cycle(row, cycle) as f64;
                self.set(row, col, impedance[row] * sign);
                net_source += source[row] * sign;
            }
            self.set(constants, col, net_source);
        }
        Ok(())
    }

    /// Equation-major augmented matrix: one row per equation, one column per
    /// branch, last column the constants.
    pub fn augmented(&self) -> Vec<Complex64> {
        let cols = self.branches + 1;
        let mut out = vec![Complex64::default(); self.equations() * cols];
        for eq in 0..self.equations() {
            for row in 0..=self.branches {
                out[eq * cols + row] = self.get(row, eq);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_blocks() {
        // Single loop: source + resistor
        let mut g = Graph::new(1);
        let src = g.add_edge();
        let res = g.add_edge();
        let (si, so) = (g.edge(src).unwrap().input, g.edge(src).unwrap().output);
        let (ri, ro) = (g.edge(res).unwrap().input, g.edge(res).unwrap().output);
        g.merge_vertices(so, ri).unwrap();
        g.merge_vertices(si, ro).unwrap();
        g.edge_mut(src).unwrap().source_voltage[0] = Complex64::new(5.0, 0.0);
        g.edge_mut(res).unwrap().impedance[0] = Complex64::new(2.0, 0.0);

        let topo = Topology::build(&g).unwrap();
        let sys = LinearSystem::assemble(&topo, &g, 0).unwrap();
        assert_eq!(sys.branches, 2);
        assert_eq!(sys.vertex_equations, 2);
        assert_eq!(sys.cycle_equations, 1);

        let kvl = sys.vertex_equations;
        let r = topo.branch_index(res).unwrap();
        let s = topo.branch_index(src).unwrap();
        let sign = topo.cycle(r, 0) as f64;
        assert_eq!(sys.get(r, kvl), Complex64::new(2.0 * sign, 0.0));
        assert_eq!(sys.get(s, kvl), Complex64::default());
        assert_eq!(sys.get(2, kvl), Complex64::new(5.0 * topo.cycle(s, 0) as f64, 0.0));

        let aug = sys.augmented();
        assert_eq!(aug.len(), 3 * 3);
        assert_eq!(aug[kvl * 3 + r], sys.get(r, kvl));
    }
}
