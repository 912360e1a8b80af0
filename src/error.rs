//! Error types for the Phasor network solver.
//!
//! [`NetworkError`] covers caller bugs (operating on handles the network does
//! not know, degenerate merges, broken traversal invariants) and malformed
//! persisted networks. Numerical failures of a single frequency solve are a
//! separate, recoverable [`SolveError`]: they never escape `evaluate`, they
//! only flip the network's validity flag.

use thiserror::Error;

use crate::graph::{ComponentId, EdgeId, VertexId};

/// Result type alias using [`NetworkError`].
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Unified error type for all network operations.
#[derive(Error, Debug)]
pub enum NetworkError {
    // ============ Invariant Violations ============
    /// Vertex handle not present in the graph
    #[error("Vertex {vertex} is not part of the network")]
    UnknownVertex { vertex: VertexId },

    /// Edge handle not present in the graph
    #[error("Edge {edge} is not part of the network")]
    UnknownEdge { edge: EdgeId },

    /// Component handle not present in the network
    #[error("Component {component} is not part of the network")]
    UnknownComponent { component: ComponentId },

    /// Merging the two ends of one component would create a self-loop
    #[error("Cannot merge both ends of component {component} into one vertex")]
    SelfLoopMerge { component: ComponentId },

    /// The vertex being merged is adjacent to the persistent vertex
    #[error("Cannot merge vertex {merge} into its neighbour {persistent}")]
    NeighbouringMerge { persistent: VertexId, merge: VertexId },

    /// Same-depth edge found while building the spanning forest
    #[error("Cross edge {edge} encountered in undirected spanning forest")]
    CrossEdge { edge: EdgeId },

    /// Frequency released that was never requested
    #[error("Angular frequency {omega} is not registered")]
    UnknownFrequency { omega: f64 },

    /// Negative, infinite or NaN angular frequency
    #[error("Angular frequency {omega} cannot be simulated")]
    InvalidFrequency { omega: f64 },

    /// The DC slot must always stay registered
    #[error("The DC slot cannot be released")]
    DcRelease,

    /// Component whose two terminals coincide
    #[error("Component terminals coincide at [{x}, {y}]")]
    DegenerateComponent { x: f64, y: f64 },

    /// Adjacency maps disagree with edge endpoints
    #[error("Inconsistent graph: {message}")]
    Inconsistent { message: String },

    /// Parameter edit that would move the output end onto or off ground
    #[error("Component {component} cannot change between grounded and two-terminal kinds")]
    GroundingChange { component: ComponentId },

    /// Grounded output ends cannot be grabbed
    #[error("Output of component {component} is fixed to ground")]
    FixedTerminal { component: ComponentId },

    /// Drag or release without a matching grab
    #[error("Nothing is grabbed for {what}")]
    NotGrabbed { what: String },

    // ============ Persistence Errors ============
    /// Error during lexical analysis of a saved network
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing of a saved network
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Unknown component class
    #[error("Unknown component class '{class}' at line {line}")]
    UnknownClass { class: String, line: usize },

    /// Required field missing from a component line
    #[error("Component '{class}' at line {line} is missing field '{field}'")]
    MissingField {
        class: String,
        field: String,
        line: usize,
    },

    /// Error reading a saved network file
    #[error("Failed to read network file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl NetworkError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Lexer {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(class: impl Into<String>, field: impl Into<String>, line: usize) -> Self {
        Self::MissingField {
            class: class.into(),
            field: field.into(),
            line,
        }
    }
}

/// Failure of one per-frequency linear solve.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    /// Rank deficiency: an unknown has no pivot
    #[error("Indeterminate system - branch current {column} is unconstrained")]
    Indeterminate { column: usize },

    /// Inconsistent constraint: zero left-hand side with a non-zero constant
    #[error("Inconsistent system - equation {row} has no solution")]
    NoSolution { row: usize },
}
