//! Graph consistency checks.

use crate::error::{NetworkError, Result};

use super::Graph;

fn inconsistent(message: String) -> NetworkError {
    NetworkError::Inconsistent { message }
}

/// Validate the adjacency invariants of a graph.
///
/// Checks:
/// - No vertex lists itself as a neighbour
/// - Every edge is registered at both endpoints with matching orientation
/// - Every adjacency entry refers to an existing edge with those endpoints
/// - All per-frequency vectors have the graph's slot count
pub fn validate_graph(graph: &Graph) -> Result<()> {
    let slots = graph.slot_count();

    for edge in graph.edges() {
        if edge.input == edge.output {
            return Err(inconsistent(format!("{} is a self-loop on {}", edge.id, edge.input)));
        }
        if !graph.vertex(edge.input)?.outgoing.contains(&(edge.output, edge.id)) {
            return Err(inconsistent(format!("{} missing from outgoing set of {}", edge.id, edge.input)));
        }
        if !graph.vertex(edge.output)?.incoming.contains(&(edge.input, edge.id)) {
            return Err(inconsistent(format!("{} missing from incoming set of {}", edge.id, edge.output)));
        }
        if edge.impedance.len() != slots || edge.source_voltage.len() != slots || edge.current.len() != slots {
            return Err(inconsistent(format!("{} has stale frequency vectors", edge.id)));
        }
    }

    for vertex in graph.vertices() {
        if vertex.input_current.len() != slots {
            return Err(inconsistent(format!("{} has stale frequency vectors", vertex.id)));
        }
        for &(nbr, e) in &vertex.outgoing {
            let edge = graph.edge(e)?;
            if nbr == vertex.id || edge.input != vertex.id || edge.output != nbr {
                return Err(inconsistent(format!("{} lists {} as outgoing to {}", vertex.id, e, nbr)));
            }
        }
        for &(nbr, e) in &vertex.incoming {
            let edge = graph.edge(e)?;
            if nbr == vertex.id || edge.output != vertex.id || edge.input != nbr {
                return Err(inconsistent(format!("{} lists {} as incoming from {}", vertex.id, e, nbr)));
            }
        }
    }

    Ok(())
}
