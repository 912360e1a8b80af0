//! Component models attached to the network graph.
//!
//! This module provides the closed set of supported components:
//! - Passive: Wire, Resistor, Capacitor, Inductor
//! - Sources: DC/AC/square voltage sources, DC/AC current sources
//! - Ground: a wire from its input terminal to the shared ground vertex
//!
//! Each component owns exactly one edge of the graph. Its electrical contract
//! is the impedance, source voltage and injected current it contributes at a
//! given angular frequency, plus the set of frequencies it needs simulated.

mod linear;
mod sources;

pub use linear::{Capacitor, Inductor, Resistor, Wire};
pub use sources::{DcCurrentSource, DcVoltageSource, Sinusoid, SquareVoltageSource};

use num_complex::Complex64;

use crate::error::{NetworkError, Result};
use crate::graph::{ComponentId, EdgeId, Point, Terminal};
use crate::persist::{self, Record};
use crate::OPEN_CIRCUIT_IMPEDANCE;

/// Default number of odd harmonics for a square source.
pub const DEFAULT_SQUARE_HARMONICS: usize = 7;

/// Each harmonic holds a frequency slot, so the count is bounded.
pub const MAX_SQUARE_HARMONICS: usize = 256;

/// The electrical behaviour of a component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentKind {
    Wire(Wire),
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    DcVoltageSource(DcVoltageSource),
    AcVoltageSource(Sinusoid),
    SquareVoltageSource(SquareVoltageSource),
    DcCurrentSource(DcCurrentSource),
    AcCurrentSource(Sinusoid),
    Ground,
}

impl ComponentKind {
    /// Class name used in saved networks.
    pub fn class_name(&self) -> &'static str {
        match self {
            ComponentKind::Wire(_) => "Wire",
            ComponentKind::Resistor(_) => "Resistor",
            ComponentKind::Capacitor(_) => "Capacitor",
            ComponentKind::Inductor(_) => "Inductor",
            ComponentKind::DcVoltageSource(_) => "DcVoltageSource",
            ComponentKind::AcVoltageSource(_) => "AcVoltageSource",
            ComponentKind::SquareVoltageSource(_) => "SquareVoltageSource",
            ComponentKind::DcCurrentSource(_) => "DcCurrentSource",
            ComponentKind::AcCurrentSource(_) => "AcCurrentSource",
            ComponentKind::Ground => "Ground",
        }
    }

    /// Whether the output end is tied to the ground vertex.
    pub fn is_grounded(&self) -> bool {
        matches!(self, ComponentKind::Ground)
    }

    /// Whether the component drives a current rather than carrying one.
    pub fn is_current_source(&self) -> bool {
        matches!(
            self,
            ComponentKind::DcCurrentSource(_) | ComponentKind::AcCurrentSource(_)
        )
    }

    /// Branch impedance at angular frequency `omega`.
    pub fn impedance(&self, omega: f64) -> Complex64 {
        match self {
            ComponentKind::Wire(w) => w.impedance(omega),
            ComponentKind::Resistor(r) => r.impedance(omega),
            ComponentKind::Capacitor(c) => c.impedance(omega),
            ComponentKind::Inductor(l) => l.impedance(omega),
            ComponentKind::DcCurrentSource(_) | ComponentKind::AcCurrentSource(_) => {
                Complex64::new(OPEN_CIRCUIT_IMPEDANCE, 0.0)
            }
            ComponentKind::DcVoltageSource(_)
            | ComponentKind::AcVoltageSource(_)
            | ComponentKind::SquareVoltageSource(_)
            | ComponentKind::Ground => Complex64::default(),
        }
    }

    /// Source voltage raising the potential from input to output, as
    /// `(ω, phasor)` pairs.
    pub fn source_spectrum(&self) -> Vec<(f64, Complex64)> {
        match self {
            ComponentKind::DcVoltageSource(v) => vec![(0.0, v.phasor())],
            ComponentKind::AcVoltageSource(v) => vec![(v.angular_frequency, v.phasor())],
            ComponentKind::SquareVoltageSource(v) => v.spectrum(),
            _ => Vec::new(),
        }
    }

    /// Current driven from the input vertex into the output vertex, as
    /// `(ω, phasor)` pairs.
    pub fn injected_spectrum(&self) -> Vec<(f64, Complex64)> {
        match self {
            ComponentKind::DcCurrentSource(i) => vec![(0.0, i.phasor())],
            ComponentKind::AcCurrentSource(i) => vec![(i.angular_frequency, i.phasor())],
            _ => Vec::new(),
        }
    }

    /// Non-DC angular frequencies this component needs registered.
    pub fn required_frequencies(&self) -> Vec<f64> {
        match self {
            ComponentKind::AcVoltageSource(s) | ComponentKind::AcCurrentSource(s) => s.frequencies(),
            ComponentKind::SquareVoltageSource(s) => s.frequencies(),
            _ => Vec::new(),
        }
    }

    /// Named numeric parameters, in save order.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        match self {
            ComponentKind::Wire(_) | ComponentKind::Ground => Vec::new(),
            ComponentKind::Resistor(r) => vec![("resistance", r.resistance)],
            ComponentKind::Capacitor(c) => vec![("capacitance", c.capacitance)],
            ComponentKind::Inductor(l) => vec![("inductance", l.inductance)],
            ComponentKind::DcVoltageSource(v) => vec![("voltage", v.voltage)],
            ComponentKind::DcCurrentSource(i) => vec![("current", i.current)],
            ComponentKind::AcVoltageSource(s) | ComponentKind::AcCurrentSource(s) => vec![
                ("amplitude", s.amplitude),
                ("angular_frequency", s.angular_frequency),
                ("phase", s.phase),
            ],
            ComponentKind::SquareVoltageSource(s) => vec![
                ("amplitude", s.amplitude),
                ("angular_frequency", s.angular_frequency),
                ("harmonics", s.harmonics as f64),
            ],
        }
    }

    /// Build a component kind from a parsed record.
    pub fn from_record(record: &Record) -> Result<Self> {
        let sinusoid = |record: &Record| -> Result<Sinusoid> {
            Ok(Sinusoid::new(
                record.number("amplitude")?,
                record.number("angular_frequency")?,
                record.number_or("phase", 0.0)?,
            ))
        };

        match record.class.as_str() {
            "Wire" => Ok(ComponentKind::Wire(Wire)),
            "Resistor" => Ok(ComponentKind::Resistor(Resistor::new(record.number("resistance")?))),
            "Capacitor" => Ok(ComponentKind::Capacitor(Capacitor::new(record.number("capacitance")?))),
            "Inductor" => Ok(ComponentKind::Inductor(Inductor::new(record.number("inductance")?))),
            "DcVoltageSource" => Ok(ComponentKind::DcVoltageSource(DcVoltageSource::new(
                record.number("voltage")?,
            ))),
            "AcVoltageSource" => Ok(ComponentKind::AcVoltageSource(sinusoid(record)?)),
            "SquareVoltageSource" => {
                let harmonics = record.number_or("harmonics", DEFAULT_SQUARE_HARMONICS as f64)?;
                if harmonics.is_nan() || harmonics > MAX_SQUARE_HARMONICS as f64 {
                    return Err(NetworkError::parse(
                        record.line,
                        format!("harmonics must be at most {}, got {}", MAX_SQUARE_HARMONICS, harmonics),
                    ));
                }
                Ok(ComponentKind::SquareVoltageSource(SquareVoltageSource::new(
                    record.number("amplitude")?,
                    record.number("angular_frequency")?,
                    harmonics.max(1.0) as usize,
                )))
            }
            "DcCurrentSource" => Ok(ComponentKind::DcCurrentSource(DcCurrentSource::new(
                record.number("current")?,
            ))),
            "AcCurrentSource" => Ok(ComponentKind::AcCurrentSource(sinusoid(record)?)),
            "Ground" => Ok(ComponentKind::Ground),
            _ => Err(NetworkError::UnknownClass {
                class: record.class.clone(),
                line: record.line,
            }),
        }
    }
}

/// Everything needed to place a component: its kind and terminal positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub input: Point,
    pub output: Point,
}

impl ComponentSpec {
    pub fn new(kind: ComponentKind, input: Point, output: Point) -> Self {
        Self { kind, input, output }
    }

    /// Render as one line of the saved-network format.
    pub fn save(&self) -> String {
        let mut line = format!("class: {}", self.kind.class_name());
        for (key, value) in self.kind.parameters() {
            line.push_str(&format!("; {}: {}", key, value));
        }
        line.push_str(&format!("; input: {}; output: {}", self.input, self.output));
        line
    }

    /// Parse one line of the saved-network format.
    pub fn load(line: &str) -> Result<Self> {
        let record = persist::parse_line(line)?;
        Self::from_record(&record)
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            kind: ComponentKind::from_record(record)?,
            input: record.point("input")?,
            output: record.point("output")?,
        })
    }
}

/// A component placed in the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    pub input: Point,
    pub output: Point,
    /// The branch this component owns
    pub edge: EdgeId,
}

impl Component {
    pub fn new(id: ComponentId, spec: ComponentSpec, edge: EdgeId) -> Self {
        Self {
            id,
            kind: spec.kind,
            input: spec.input,
            output: spec.output,
            edge,
        }
    }

    /// Kind and positions, detached from the graph.
    pub fn spec(&self) -> ComponentSpec {
        ComponentSpec::new(self.kind, self.input, self.output)
    }

    pub fn save(&self) -> String {
        self.spec().save()
    }

    /// Position of one terminal.
    pub fn position(&self, terminal: Terminal) -> Point {
        match terminal {
            Terminal::Input => self.input,
            Terminal::Output => self.output,
        }
    }

    pub fn set_position(&mut self, terminal: Terminal, pos: Point) {
        match terminal {
            Terminal::Input => self.input = pos,
            Terminal::Output => self.output = pos,
        }
    }

    /// Terminals that can be grabbed and merged. A grounded component's
    /// output is the ground vertex itself and is not draggable.
    pub fn terminals(&self) -> &'static [Terminal] {
        if self.kind.is_grounded() {
            &[Terminal::Input]
        } else {
            &[Terminal::Input, Terminal::Output]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_format() {
        let spec = ComponentSpec::new(
            ComponentKind::Resistor(Resistor::new(10.0)),
            Point::new(0.0, 0.0),
            Point::new(1.5, 0.0),
        );
        assert_eq!(
            spec.save(),
            "class: Resistor; resistance: 10; input: [0, 0]; output: [1.5, 0]"
        );
    }

    #[test]
    fn test_load_saved_line() {
        let line = "class: AcVoltageSource; amplitude: 2; angular_frequency: 100; input: [0, 0]; output: [0, -1]";
        let spec = ComponentSpec::load(line).unwrap();
        assert_eq!(spec.kind, ComponentKind::AcVoltageSource(Sinusoid::new(2.0, 100.0, 0.0)));
        assert_eq!(spec.output, Point::new(0.0, -1.0));
        assert_eq!(ComponentSpec::load(&spec.save()).unwrap(), spec);
    }

    #[test]
    fn test_load_rejects_unknown_class() {
        let err = ComponentSpec::load("class: Diode; input: [0, 0]; output: [1, 0]").unwrap_err();
        assert!(matches!(err, NetworkError::UnknownClass { .. }));
    }

    #[test]
    fn test_load_reports_missing_field() {
        let err = ComponentSpec::load("class: Resistor; input: [0, 0]; output: [1, 0]").unwrap_err();
        assert!(matches!(err, NetworkError::MissingField { ref field, .. } if field == "resistance"));
    }

    #[test]
    fn test_current_source_contract() {
        let kind = ComponentKind::DcCurrentSource(DcCurrentSource::new(0.2));
        assert!(kind.is_current_source());
        assert_eq!(kind.injected_spectrum(), vec![(0.0, Complex64::new(0.2, 0.0))]);
        assert!(kind.source_spectrum().is_empty());
        assert_eq!(kind.impedance(0.0).re, OPEN_CIRCUIT_IMPEDANCE);
        assert!(kind.required_frequencies().is_empty());
    }

    #[test]
    fn test_load_rejects_excessive_harmonics() {
        let line = "class: SquareVoltageSource; amplitude: 1; angular_frequency: 10; harmonics: 1e12; input: [0, 0]; output: [1, 0]";
        let err = ComponentSpec::load(line).unwrap_err();
        assert!(matches!(err, NetworkError::Parse { .. }));

        let line = "class: SquareVoltageSource; amplitude: 1; angular_frequency: 10; harmonics: 3; input: [0, 0]; output: [1, 0]";
        let spec = ComponentSpec::load(line).unwrap();
        assert_eq!(spec.kind.required_frequencies(), vec![10.0, 30.0, 50.0]);
    }
}
