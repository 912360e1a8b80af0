//! Node potential reconstruction.

use std::collections::{HashMap, VecDeque};

use crate::error::Result;
use crate::graph::{Graph, VertexId};

/// Propagate the edges' time-domain voltage drops into vertex potentials.
///
/// Breadth-first from the first untouched vertex of every island: a vertex
/// reached along an edge's orientation sits one drop below its parent, one
/// reached against it sits one drop above. Each island is then scaled to
/// `[0, 1]` on its own min/max, since islands share no reference. An island
/// with no spread gets 0 everywhere.
///
/// Returns the number of islands.
pub fn reconstruct_potentials(graph: &mut Graph) -> Result<usize> {
    let mut raw: HashMap<VertexId, f64> = HashMap::with_capacity(graph.vertex_count());
    let mut islands: Vec<Vec<VertexId>> = Vec::new();
    let mut queue = VecDeque::new();

    for root in graph.vertices().map(|v| v.id) {
        if raw.contains_key(&root) {
            continue;
        }
        raw.insert(root, 0.0);
        let mut members = vec![root];
        queue.push_back(root);

        while let Some(at) = queue.pop_front() {
            let here = raw.get(&at).copied().unwrap_or_default();
            let vertex = graph.vertex(at)?;
            let leaving = vertex.outgoing.iter().map(|&(nbr, e)| (nbr, e, -1.0));
            let arriving = vertex.incoming.iter().map(|&(nbr, e)| (nbr, e, 1.0));
            for (nbr, edge, sign) in leaving.chain(arriving) {
                if raw.contains_key(&nbr) {
                    continue;
                }
                let drop = graph.edge(edge)?.voltage_drop_t;
                raw.insert(nbr, here + sign * drop);
                members.push(nbr);
                queue.push_back(nbr);
            }
        }
        islands.push(members);
    }

    for members in &islands {
        let (min, max) = members
            .iter()
            .filter_map(|v| raw.get(v))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        let spread = max - min;
        for &v in members {
            let p = raw.get(&v).copied().unwrap_or_default();
            graph.vertex_mut(v)?.potential = if spread > f64::EPSILON {
                (p - min) / spread
            } else {
                0.0
            };
        }
    }

    Ok(islands.len())
}
