//! Undirected multigraph of circuit branches.
//!
//! Vertices and edges live in an arena keyed by stable integer handles.
//! Adjacency is stored per vertex as ordered sets of `(neighbour, edge)` pairs,
//! one set for edges leaving the vertex (the vertex is the edge's input) and
//! one for edges arriving at it. Parallel edges are therefore distinct entries.

use std::collections::{BTreeMap, BTreeSet};

use num_complex::Complex64;

use super::types::{EdgeId, Terminal, VertexId};
use crate::error::{NetworkError, Result};
use crate::solver::projector;

/// How the time-domain voltage drop of a branch is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropConvention {
    /// `drop = I·Z` when the branch has no instantaneous source voltage,
    /// otherwise `drop = -Vs`. A branch whose sources happen to cancel at the
    /// sampled instant is reported as source-free.
    #[default]
    SourceOverride,
    /// `drop = I·Z - Vs` for every branch.
    Full,
}

/// A graph node.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    /// `(neighbour, edge)` for edges whose output is this vertex
    pub incoming: BTreeSet<(VertexId, EdgeId)>,
    /// `(neighbour, edge)` for edges whose input is this vertex
    pub outgoing: BTreeSet<(VertexId, EdgeId)>,
    /// External current injected at this vertex, per frequency slot
    pub input_current: Vec<Complex64>,
    /// Injected current at the last projected instant
    pub input_current_t: f64,
    /// Normalized potential at the last projected instant
    pub potential: f64,
}

impl Vertex {
    fn new(id: VertexId, slots: usize) -> Self {
        Self {
            id,
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
            input_current: vec![Complex64::default(); slots],
            input_current_t: 0.0,
            potential: 0.0,
        }
    }

    /// Number of edge ends attached to this vertex.
    pub fn degree(&self) -> usize {
        self.incoming.len() + self.outgoing.len()
    }

    /// Check whether any edge connects this vertex to `other`.
    pub fn is_adjacent_to(&self, other: VertexId) -> bool {
        self.incoming
            .iter()
            .chain(self.outgoing.iter())
            .any(|&(nbr, _)| nbr == other)
    }
}

/// One circuit branch.
///
/// Current flows from `input` to `output`. The branch law at every slot `k`
/// is `V(input) - V(output) = Z[k]·I[k] - Vs[k]`.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub input: VertexId,
    pub output: VertexId,
    pub impedance: Vec<Complex64>,
    pub source_voltage: Vec<Complex64>,
    pub current: Vec<Complex64>,

    // Derived time-domain values
    pub current_t: f64,
    pub source_voltage_t: f64,
    pub voltage_drop_t: f64,
}

impl Edge {
    fn new(id: EdgeId, input: VertexId, output: VertexId, slots: usize) -> Self {
        Self {
            id,
            input,
            output,
            impedance: vec![Complex64::default(); slots],
            source_voltage: vec![Complex64::default(); slots],
            current: vec![Complex64::default(); slots],
            current_t: 0.0,
            source_voltage_t: 0.0,
            voltage_drop_t: 0.0,
        }
    }

    /// The vertex at the given end.
    pub fn endpoint(&self, terminal: Terminal) -> VertexId {
        match terminal {
            Terminal::Input => self.input,
            Terminal::Output => self.output,
        }
    }

    /// `Z·I` per slot.
    pub fn impedance_drop(&self) -> Vec<Complex64> {
        self.current
            .iter()
            .zip(&self.impedance)
            .map(|(i, z)| i * z)
            .collect()
    }

    /// Recompute the time-domain scalars at time `t`.
    ///
    /// With `slots` set only those frequency slots contribute.
    pub fn project(&mut self, omegas: &[f64], t: f64, slots: Option<&[usize]>, convention: DropConvention) {
        let sum = |phasors: &[Complex64]| match slots {
            Some(slots) => projector::project_subset(phasors, omegas, slots, t),
            None => projector::project(phasors, omegas, t),
        };
        self.current_t = sum(&self.current);
        self.source_voltage_t = sum(&self.source_voltage);
        let ir_drop = sum(&self.impedance_drop());
        self.voltage_drop_t = match convention {
            DropConvention::SourceOverride => {
                if self.source_voltage_t == 0.0 {
                    ir_drop
                } else {
                    -self.source_voltage_t
                }
            }
            DropConvention::Full => ir_drop - self.source_voltage_t,
        };
    }
}

/// Arena holding every vertex and edge of the network.
#[derive(Debug, Clone)]
pub struct Graph {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    next_vertex: usize,
    next_edge: usize,
    slots: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Graph {
    /// Create a graph holding only the ground vertex.
    pub fn new(slots: usize) -> Self {
        let mut vertices = BTreeMap::new();
        vertices.insert(VertexId::GROUND, Vertex::new(VertexId::GROUND, slots));
        Self {
            vertices,
            edges: BTreeMap::new(),
            next_vertex: 1,
            next_edge: 0,
            slots,
        }
    }

    /// Number of frequency slots every per-frequency vector holds.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Number of vertices, ground included.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices in handle order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Edges in handle order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.vertices.values_mut()
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.values_mut()
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(&id)
            .ok_or(NetworkError::UnknownVertex { vertex: id })
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.vertices
            .get_mut(&id)
            .ok_or(NetworkError::UnknownVertex { vertex: id })
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges.get(&id).ok_or(NetworkError::UnknownEdge { edge: id })
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge> {
        self.edges
            .get_mut(&id)
            .ok_or(NetworkError::UnknownEdge { edge: id })
    }

    /// Allocate an isolated vertex.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.next_vertex);
        self.next_vertex += 1;
        self.vertices.insert(id, Vertex::new(id, self.slots));
        id
    }

    /// Add an edge between two fresh vertices.
    pub fn add_edge(&mut self) -> EdgeId {
        let input = self.add_vertex();
        let output = self.add_vertex();
        self.insert_edge(input, output)
    }

    /// Add an edge from a fresh vertex to the ground vertex.
    pub fn add_edge_with_grounded_output(&mut self) -> EdgeId {
        let input = self.add_vertex();
        self.insert_edge(input, VertexId::GROUND)
    }

    fn insert_edge(&mut self, input: VertexId, output: VertexId) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Edge::new(id, input, output, self.slots));
        if let Some(v) = self.vertices.get_mut(&input) {
            v.outgoing.insert((output, id));
        }
        if let Some(v) = self.vertices.get_mut(&output) {
            v.incoming.insert((input, id));
        }
        id
    }

    /// Remove an edge, deleting endpoints it leaves isolated (ground excepted).
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        let input = self.detach_end(id, Terminal::Input)?;
        let output = self.edge(id)?.output;
        self.edges.remove(&id);

        for vertex in [input, output] {
            if !vertex.is_ground() && self.vertex(vertex)?.degree() == 0 {
                self.vertices.remove(&vertex);
            }
        }
        Ok(())
    }

    /// Give one end of an edge its own vertex when that vertex is shared.
    ///
    /// Returns the new vertex, or `None` when the end was already exclusive
    /// (or sits on ground, which is never split).
    pub fn disconnect_end_of_edge(&mut self, id: EdgeId, terminal: Terminal) -> Result<Option<VertexId>> {
        let shared = self.edge(id)?.endpoint(terminal);
        if shared.is_ground() || self.vertex(shared)?.degree() <= 1 {
            return Ok(None);
        }
        let fresh = self.add_vertex();
        self.detach_end(id, terminal)?;
        self.attach_end(id, terminal, fresh)?;
        tracing::trace!(edge = %id, from = %shared, to = %fresh, "split vertex");
        Ok(Some(fresh))
    }

    /// Rewire every edge end of `merge` onto `persistent` and drop `merge`.
    ///
    /// Ground always survives a merge. Merging a vertex with itself is a no-op.
    /// Returns the surviving vertex.
    pub fn merge_vertices(&mut self, persistent: VertexId, merge: VertexId) -> Result<VertexId> {
        if persistent == merge {
            return Ok(persistent);
        }
        let (persistent, merge) = if merge.is_ground() {
            (merge, persistent)
        } else {
            (persistent, merge)
        };
        self.vertex(persistent)?;
        let doomed = self.vertex(merge)?;
        if doomed.is_adjacent_to(persistent) {
            return Err(NetworkError::NeighbouringMerge { persistent, merge });
        }

        let leaving: Vec<EdgeId> = doomed.outgoing.iter().map(|&(_, e)| e).collect();
        let arriving: Vec<EdgeId> = doomed.incoming.iter().map(|&(_, e)| e).collect();
        let injected = doomed.input_current.clone();

        for edge in leaving {
            self.detach_end(edge, Terminal::Input)?;
            self.attach_end(edge, Terminal::Input, persistent)?;
        }
        for edge in arriving {
            self.detach_end(edge, Terminal::Output)?;
            self.attach_end(edge, Terminal::Output, persistent)?;
        }

        let kept = self.vertex_mut(persistent)?;
        for (slot, current) in injected.into_iter().enumerate() {
            kept.input_current[slot] += current;
        }
        self.vertices.remove(&merge);
        tracing::trace!(%persistent, %merge, "merged vertices");
        Ok(persistent)
    }

    /// Remove the adjacency entries for one end of an edge.
    /// Returns the vertex that end was attached to.
    fn detach_end(&mut self, id: EdgeId, terminal: Terminal) -> Result<VertexId> {
        let edge = self.edge(id)?;
        let here = edge.endpoint(terminal);
        let there = edge.endpoint(terminal.other());
        match terminal {
            Terminal::Input => {
                self.vertex_mut(here)?.outgoing.remove(&(there, id));
                self.vertex_mut(there)?.incoming.remove(&(here, id));
            }
            Terminal::Output => {
                self.vertex_mut(here)?.incoming.remove(&(there, id));
                self.vertex_mut(there)?.outgoing.remove(&(here, id));
            }
        }
        Ok(here)
    }

    /// Point one end of an edge at `vertex` and restore both adjacency entries.
    fn attach_end(&mut self, id: EdgeId, terminal: Terminal, vertex: VertexId) -> Result<()> {
        self.vertex(vertex)?;
        let edge = self.edge_mut(id)?;
        match terminal {
            Terminal::Input => edge.input = vertex,
            Terminal::Output => edge.output = vertex,
        }
        let (input, output) = (edge.input, edge.output);
        self.vertex_mut(input)?.outgoing.insert((output, id));
        self.vertex_mut(output)?.incoming.insert((input, id));
        Ok(())
    }

    /// Open a zeroed slot at `slot` in every per-frequency vector.
    pub fn insert_slot(&mut self, slot: usize) {
        for edge in self.edges.values_mut() {
            edge.impedance.insert(slot, Complex64::default());
            edge.source_voltage.insert(slot, Complex64::default());
            edge.current.insert(slot, Complex64::default());
        }
        for vertex in self.vertices.values_mut() {
            vertex.input_current.insert(slot, Complex64::default());
        }
        self.slots += 1;
    }

    /// Drop `slot` from every per-frequency vector, shifting higher slots down.
    pub fn remove_slot(&mut self, slot: usize) {
        for edge in self.edges.values_mut() {
            edge.impedance.remove(slot);
            edge.source_voltage.remove(slot);
            edge.current.remove(slot);
        }
        for vertex in self.vertices.values_mut() {
            vertex.input_current.remove(slot);
        }
        self.slots -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_allocates_fresh_vertices() {
        let mut g = Graph::new(1);
        let e = g.add_edge();
        assert_eq!(g.vertex_count(), 3);
        let edge = g.edge(e).unwrap();
        assert!(!edge.input.is_ground());
        assert!(g.vertex(edge.input).unwrap().outgoing.contains(&(edge.output, e)));
        assert!(g.vertex(edge.output).unwrap().incoming.contains(&(edge.input, e)));
    }

    #[test]
    fn test_grounded_output_reuses_ground() {
        let mut g = Graph::new(1);
        let a = g.add_edge_with_grounded_output();
        let b = g.add_edge_with_grounded_output();
        assert_eq!(g.edge(a).unwrap().output, VertexId::GROUND);
        assert_eq!(g.edge(b).unwrap().output, VertexId::GROUND);
        assert_eq!(g.vertex(VertexId::GROUND).unwrap().incoming.len(), 2);
    }

    #[test]
    fn test_remove_edge_keeps_shared_vertices() {
        let mut g = Graph::new(1);
        let a = g.add_edge();
        let b = g.add_edge();
        let a_out = g.edge(a).unwrap().output;
        let b_in = g.edge(b).unwrap().input;
        g.merge_vertices(a_out, b_in).unwrap();
        assert_eq!(g.vertex_count(), 4);

        g.remove_edge(a).unwrap();
        // a's input vanished, the shared vertex stays for b
        assert_eq!(g.vertex_count(), 3);
        assert!(g.vertex(a_out).is_ok());
        assert_eq!(g.edge(b).unwrap().input, a_out);
    }

    #[test]
    fn test_remove_edge_never_deletes_ground() {
        let mut g = Graph::new(1);
        let e = g.add_edge_with_grounded_output();
        g.remove_edge(e).unwrap();
        assert_eq!(g.vertex_count(), 1);
        assert!(g.vertex(VertexId::GROUND).is_ok());
    }

    #[test]
    fn test_merge_refuses_neighbours() {
        let mut g = Graph::new(1);
        let e = g.add_edge();
        let (i, o) = (g.edge(e).unwrap().input, g.edge(e).unwrap().output);
        assert!(matches!(
            g.merge_vertices(i, o),
            Err(NetworkError::NeighbouringMerge { .. })
        ));
        // Self-merge is a no-op
        assert_eq!(g.merge_vertices(i, i).unwrap(), i);
        assert_eq!(g.vertex_count(), 3);
    }

    #[test]
    fn test_merge_into_ground_keeps_ground() {
        let mut g = Graph::new(1);
        let e = g.add_edge();
        let o = g.edge(e).unwrap().output;
        assert_eq!(g.merge_vertices(o, VertexId::GROUND).unwrap(), VertexId::GROUND);
        assert_eq!(g.edge(e).unwrap().output, VertexId::GROUND);
        assert!(g.vertex(o).is_err());
    }

    #[test]
    fn test_disconnect_clones_shared_end() {
        let mut g = Graph::new(1);
        let a = g.add_edge();
        let b = g.add_edge();
        let shared = g.edge(a).unwrap().output;
        let b_in = g.edge(b).unwrap().input;
        g.merge_vertices(shared, b_in).unwrap();

        let fresh = g.disconnect_end_of_edge(b, Terminal::Input).unwrap();
        assert!(fresh.is_some());
        assert_ne!(g.edge(b).unwrap().input, shared);
        assert_eq!(g.vertex(shared).unwrap().degree(), 1);

        // Already exclusive: nothing to clone
        assert_eq!(g.disconnect_end_of_edge(b, Terminal::Input).unwrap(), None);
    }

    #[test]
    fn test_slot_insert_and_remove() {
        let mut g = Graph::new(1);
        let e = g.add_edge();
        g.edge_mut(e).unwrap().impedance[0] = Complex64::new(5.0, 0.0);
        g.insert_slot(0);
        assert_eq!(g.slot_count(), 2);
        assert_eq!(g.edge(e).unwrap().impedance[1], Complex64::new(5.0, 0.0));
        g.remove_slot(0);
        assert_eq!(g.edge(e).unwrap().impedance, vec![Complex64::new(5.0, 0.0)]);
    }
}
