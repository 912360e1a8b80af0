//! Spanning forest and fundamental cycle basis.
//!
//! A depth-first traversal over the graph (treated as undirected) records a
//! depth, a finish number and a parent edge for every vertex, restarting from
//! the next untouched vertex whenever an island is exhausted. Every edge that
//! is not some vertex's parent edge closes exactly one independent cycle.

use std::collections::{BTreeSet, HashMap};

use crate::error::{NetworkError, Result};
use crate::graph::{EdgeId, Graph, VertexId};

/// Per-vertex bookkeeping of the depth-first traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub depth: usize,
    pub finish: usize,
    /// Tree edge to the parent, `None` for island roots
    pub parent_edge: Option<EdgeId>,
    pub parent: Option<VertexId>,
}

/// Incidence and cycle matrices derived from one traversal of the graph.
///
/// Rows follow `edges`; incidence columns follow `vertices` (every vertex
/// except ground); cycle columns follow the order non-tree edges were found.
#[derive(Debug, Clone)]
pub struct Topology {
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
    pub visits: HashMap<VertexId, Visit>,
    row_of: HashMap<EdgeId, usize>,
    /// `edges.len() × vertices.len()`, row-major
    incidence: Vec<i8>,
    /// `edges.len() × num_cycles`, row-major
    cycles: Vec<i8>,
    pub num_cycles: usize,
    pub num_islands: usize,
}

impl Topology {
    /// Traverse the graph and derive both matrices.
    pub fn build(graph: &Graph) -> Result<Self> {
        let edges: Vec<EdgeId> = graph.edges().map(|e| e.id).collect();
        let vertices: Vec<VertexId> = graph
            .vertices()
            .map(|v| v.id)
            .filter(|v| !v.is_ground())
            .collect();

        let (visits, num_islands) = depth_first(graph)?;

        let mut incidence = vec![0i8; edges.len() * vertices.len()];
        let column: HashMap<VertexId, usize> = vertices
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        for (row, &id) in edges.iter().enumerate() {
            let edge = graph.edge(id)?;
            if let Some(&col) = column.get(&edge.input) {
                incidence[row * vertices.len() + col] = 1;
            }
            if let Some(&col) = column.get(&edge.output) {
                incidence[row * vertices.len() + col] = -1;
            }
        }

        let tree: BTreeSet<EdgeId> = visits.values().filter_map(|v| v.parent_edge).collect();
        let row_of: HashMap<EdgeId, usize> = edges.iter().enumerate().map(|(i, &e)| (e, i)).collect();

        let mut columns: Vec<Vec<(usize, i8)>> = Vec::new();
        for &id in edges.iter().filter(|e| !tree.contains(e)) {
            columns.push(cycle_column(graph, &visits, &row_of, id)?);
        }

        let num_cycles = columns.len();
        let mut cycles = vec![0i8; edges.len() * num_cycles];
        for (c, entries) in columns.iter().enumerate() {
            for &(row, sign) in entries {
                cycles[row * num_cycles + c] = sign;
            }
        }

        tracing::debug!(
            edges = edges.len(),
            vertices = vertices.len(),
            cycles = num_cycles,
            islands = num_islands,
            "built spanning forest"
        );

        Ok(Self {
            edges,
            vertices,
            visits,
            row_of,
            incidence,
            cycles,
            num_cycles,
            num_islands,
        })
    }

    pub fn num_branches(&self) -> usize {
        self.edges.len()
    }

    /// Incidence entry: +1 at a branch's input vertex, -1 at its output.
    pub fn incidence(&self, branch: usize, vertex: usize) -> i8 {
        self.incidence[branch * self.vertices.len() + vertex]
    }

    /// Orientation of a branch within a cycle (0 when not part of it).
    pub fn cycle(&self, branch: usize, cycle: usize) -> i8 {
        self.cycles[branch * self.num_cycles + cycle]
    }

    /// Row of an edge in both matrices.
    pub fn branch_index(&self, edge: EdgeId) -> Option<usize> {
        self.row_of.get(&edge).copied()
    }
}

fn neighbours(graph: &Graph, vertex: VertexId) -> Result<Vec<(VertexId, EdgeId)>> {
    let v = graph.vertex(vertex)?;
    Ok(v.outgoing.iter().chain(v.incoming.iter()).copied().collect())
}

/// Iterative depth-first traversal over every island.
fn depth_first(graph: &Graph) -> Result<(HashMap<VertexId, Visit>, usize)> {
    let mut visits: HashMap<VertexId, Visit> = HashMap::with_capacity(graph.vertex_count());
    let mut finish = 0usize;
    let mut islands = 0usize;

    for root in graph.vertices().map(|v| v.id) {
        if visits.contains_key(&root) {
            continue;
        }
        islands += 1;
        visits.insert(
            root,
            Visit {
                depth: 0,
                finish: 0,
                parent_edge: None,
                parent: None,
            },
        );

        // (vertex, its neighbours, next neighbour to explore)
        let mut stack = vec![(root, neighbours(graph, root)?, 0usize)];
        while let Some(top) = stack.last_mut() {
            let vertex = top.0;
            if top.2 < top.1.len() {
                let (next, edge) = top.1[top.2];
                top.2 += 1;
                if visits.contains_key(&next) {
                    continue;
                }
                let depth = visits.get(&vertex).map_or(0, |v| v.depth) + 1;
                visits.insert(
                    next,
                    Visit {
                        depth,
                        finish: 0,
                        parent_edge: Some(edge),
                        parent: Some(vertex),
                    },
                );
                stack.push((next, neighbours(graph, next)?, 0));
            } else {
                if let Some(visit) = visits.get_mut(&vertex) {
                    visit.finish = finish;
                }
                finish += 1;
                stack.pop();
            }
        }
    }

    Ok((visits, islands))
}

/// Walk from the deeper endpoint of a non-tree edge up to the shallower one.
///
/// The cycle runs deeper → (tree edges) → shallower → (seed edge) → deeper;
/// each branch is +1 when traversed along its input→output orientation.
fn cycle_column(
    graph: &Graph,
    visits: &HashMap<VertexId, Visit>,
    row_of: &HashMap<EdgeId, usize>,
    seed: EdgeId,
) -> Result<Vec<(usize, i8)>> {
    let cross = || NetworkError::CrossEdge { edge: seed };
    let edge = graph.edge(seed)?;
    let depth_of = |v: VertexId| visits.get(&v).map(|visit| visit.depth).ok_or(NetworkError::UnknownVertex { vertex: v });

    let (input_depth, output_depth) = (depth_of(edge.input)?, depth_of(edge.output)?);
    if input_depth == output_depth {
        return Err(cross());
    }
    let (deeper, shallower) = if input_depth > output_depth {
        (edge.input, edge.output)
    } else {
        (edge.output, edge.input)
    };
    let target_depth = depth_of(shallower)?;

    let mut entries = Vec::new();
    let mut at = deeper;
    while at != shallower {
        let visit = visits.get(&at).ok_or(NetworkError::UnknownVertex { vertex: at })?;
        let (Some(parent_edge), Some(parent)) = (visit.parent_edge, visit.parent) else {
            return Err(cross());
        };
        if visit.depth <= target_depth {
            return Err(cross());
        }
        let tree_edge = graph.edge(parent_edge)?;
        let sign = if tree_edge.input == at { 1 } else { -1 };
        let row = row_of.get(&parent_edge).copied().ok_or(NetworkError::UnknownEdge { edge: parent_edge })?;
        entries.push((row, sign));
        at = parent;
    }

    let sign = if edge.input == shallower { 1 } else { -1 };
    let row = row_of.get(&seed).copied().ok_or(NetworkError::UnknownEdge { edge: seed })?;
    entries.push((row, sign));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chain `n` edges head to tail and optionally close the loop.
    fn chain(n: usize, closed: bool) -> (Graph, Vec<EdgeId>) {
        let mut g = Graph::new(1);
        let edges: Vec<EdgeId> = (0..n).map(|_| g.add_edge()).collect();
        for w in edges.windows(2) {
            let out = g.edge(w[0]).unwrap().output;
            let inp = g.edge(w[1]).unwrap().input;
            g.merge_vertices(out, inp).unwrap();
        }
        if closed {
            let out = g.edge(edges[n - 1]).unwrap().output;
            let inp = g.edge(edges[0]).unwrap().input;
            g.merge_vertices(inp, out).unwrap();
        }
        (g, edges)
    }

    #[test]
    fn test_tree_has_no_cycles() {
        let (g, _) = chain(3, false);
        let topo = Topology::build(&g).unwrap();
        assert_eq!(topo.num_cycles, 0);
        // The chain plus the isolated ground vertex
        assert_eq!(topo.num_islands, 2);
        for row in 0..3 {
            let sum: i32 = (0..topo.vertices.len()).map(|c| topo.incidence(row, c) as i32).sum();
            assert_eq!(sum, 0);
        }
    }

    #[test]
    fn test_loop_cycle_is_consistently_oriented() {
        let (g, edges) = chain(4, true);
        let topo = Topology::build(&g).unwrap();
        assert_eq!(topo.num_cycles, 1);
        // Every branch points the same way round the loop
        let signs: Vec<i8> = edges
            .iter()
            .map(|&e| topo.cycle(topo.branch_index(e).unwrap(), 0))
            .collect();
        assert!(signs.iter().all(|&s| s == signs[0] && s != 0));
    }

    #[test]
    fn test_parallel_edges_form_a_cycle() {
        let mut g = Graph::new(1);
        let a = g.add_edge();
        let b = g.add_edge();
        let (ai, ao) = (g.edge(a).unwrap().input, g.edge(a).unwrap().output);
        let (bi, bo) = (g.edge(b).unwrap().input, g.edge(b).unwrap().output);
        g.merge_vertices(ai, bi).unwrap();
        g.merge_vertices(ao, bo).unwrap();

        let topo = Topology::build(&g).unwrap();
        assert_eq!(topo.num_cycles, 1);
        // Same orientation, so they run opposite ways round the cycle
        let sa = topo.cycle(topo.branch_index(a).unwrap(), 0);
        let sb = topo.cycle(topo.branch_index(b).unwrap(), 0);
        assert_eq!(sa, -sb);
    }

    #[test]
    fn test_cycle_count_matches_circuit_rank() {
        // Two loops sharing one branch: E - V + islands
        let (mut g, edges) = chain(4, true);
        let extra = g.add_edge();
        let (ei, eo) = (g.edge(extra).unwrap().input, g.edge(extra).unwrap().output);
        let a = g.edge(edges[0]).unwrap().input;
        let c = g.edge(edges[2]).unwrap().input;
        g.merge_vertices(a, ei).unwrap();
        g.merge_vertices(c, eo).unwrap();

        let topo = Topology::build(&g).unwrap();
        let rank = g.edge_count() + topo.num_islands - g.vertex_count();
        assert_eq!(topo.num_cycles, rank);
        assert_eq!(topo.num_cycles, 2);
    }

    #[test]
    fn test_finish_order_and_depth() {
        let (g, _) = chain(2, false);
        let topo = Topology::build(&g).unwrap();
        let roots = topo.visits.values().filter(|v| v.parent.is_none()).count();
        assert_eq!(roots, topo.num_islands);
        let mut finishes: Vec<usize> = topo.visits.values().map(|v| v.finish).collect();
        finishes.sort_unstable();
        assert_eq!(finishes, (0..g.vertex_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_branch_index_follows_edge_order() {
        let (mut g, edges) = chain(4, true);
        g.remove_edge(edges[1]).unwrap();
        let topo = Topology::build(&g).unwrap();
        for (row, &edge) in topo.edges.iter().enumerate() {
            assert_eq!(topo.branch_index(edge), Some(row));
        }
        assert_eq!(topo.branch_index(edges[1]), None);
        assert_eq!(topo.branch_index(EdgeId(999)), None);
    }
}
