//! Line-oriented text format for saved networks.
//!
//! One line per component, semicolon-separated `key: value` fields. The first
//! field is always the component class; positions are written as `[x, y]`.
//!
//! # Example
//!
//! ```text
//! # Series loop
//! class: DcVoltageSource; voltage: 10; input: [0, 0]; output: [0, 1]
//! class: Resistor; resistance: 10; input: [0, 1]; output: [1, 1]
//! class: Resistor; resistance: 10; input: [1, 1]; output: [1, 0]
//! class: Wire; input: [1, 0]; output: [0, 0]
//! ```
//!
//! Numbers are plain decimals; hand-written files may also use unit suffixes
//! (`2.2k`, `100n`).

mod lexer;
mod parser;
mod record;

pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;
pub use record::{Record, Value};

use crate::components::ComponentSpec;
use crate::error::{NetworkError, Result};
use crate::network::{Network, NetworkConfig};

/// Parse a saved document into records.
pub fn parse(input: &str) -> Result<Vec<Record>> {
    let mut parser = Parser::new(Lexer::new(input))?;
    parser.parse()
}

/// Parse exactly one component line.
pub fn parse_line(line: &str) -> Result<Record> {
    let mut records = parse(line)?;
    match records.len() {
        1 => Ok(records.remove(0)),
        n => Err(NetworkError::parse(1, format!("expected one component, found {}", n))),
    }
}

/// Parse a saved document into component specs.
pub fn load_specs(input: &str) -> Result<Vec<ComponentSpec>> {
    parse(input)?.iter().map(ComponentSpec::from_record).collect()
}

/// Build a network from a saved document.
///
/// Components are added in file order; coincident terminals are merged.
pub fn load_network(input: &str, config: NetworkConfig) -> Result<Network> {
    let mut network = Network::with_config(config);
    for spec in load_specs(input)? {
        network.add_component(spec)?;
    }
    Ok(network)
}

/// Render a network as a saved document.
pub fn save_network(network: &Network) -> String {
    let mut out = String::new();
    for component in network.components() {
        out.push_str(&component.save());
        out.push('\n');
    }
    out
}

/// Read and parse a saved network file.
#[cfg(feature = "cli")]
pub fn load_file(path: &std::path::Path, config: NetworkConfig) -> Result<Network> {
    let content = std::fs::read_to_string(path).map_err(|e| NetworkError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    load_network(&content, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_merges_coincident_terminals() {
        let network = load_network(
            "# divider\n\
             class: DcVoltageSource; voltage: 5; input: [0, 0]; output: [0, 1]\n\
             \n\
             class: Resistor; resistance: 1k; input: [0, 1]; output: [0, 0]\n",
            NetworkConfig::default(),
        )
        .unwrap();
        assert_eq!(network.components().count(), 2);
        // ground + two shared vertices
        assert_eq!(network.graph().vertex_count(), 3);
    }

    #[test]
    fn test_save_lists_every_component() {
        let text = "class: Wire; input: [0, 0]; output: [2, 0]\n\
                    class: Inductor; inductance: 0.5; input: [2, 0]; output: [2, 2]\n";
        let network = load_network(text, NetworkConfig::default()).unwrap();
        assert_eq!(save_network(&network), text);
    }

    #[test]
    fn test_missing_field_reports_line() {
        let err = load_network(
            "class: Wire; input: [0, 0]; output: [1, 0]\n\
             class: Resistor; input: [1, 0]; output: [2, 0]\n",
            NetworkConfig::default(),
        )
        .unwrap_err();
        match err {
            NetworkError::MissingField { class, field, line } => {
                assert_eq!(class, "Resistor");
                assert_eq!(field, "resistance");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
