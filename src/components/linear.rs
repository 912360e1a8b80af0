//! Passive branches: Wire, Resistor, Capacitor, Inductor.

use num_complex::Complex64;

use crate::OPEN_CIRCUIT_IMPEDANCE;

/// An ideal conductor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wire;

impl Wire {
    pub fn impedance(&self, _omega: f64) -> Complex64 {
        Complex64::default()
    }
}

/// A resistor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistor {
    pub resistance: f64,
}

impl Resistor {
    pub fn new(resistance: f64) -> Self {
        Self { resistance }
    }

    /// Frequency-independent impedance `R`.
    pub fn impedance(&self, _omega: f64) -> Complex64 {
        Complex64::new(self.resistance, 0.0)
    }
}

/// A capacitor.
///
/// Impedance is `1/(jωC)`. At DC a capacitor blocks, which is modeled as
/// [`OPEN_CIRCUIT_IMPEDANCE`] so the branch stays in the cycle basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacitor {
    pub capacitance: f64,
}

impl Capacitor {
    pub fn new(capacitance: f64) -> Self {
        Self { capacitance }
    }

    pub fn impedance(&self, omega: f64) -> Complex64 {
        if omega == 0.0 || self.capacitance <= 0.0 {
            return Complex64::new(OPEN_CIRCUIT_IMPEDANCE, 0.0);
        }
        Complex64::new(0.0, -1.0 / (omega * self.capacitance))
    }
}

/// An inductor.
///
/// Impedance is `jωL`, a plain wire at DC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inductor {
    pub inductance: f64,
}

impl Inductor {
    pub fn new(inductance: f64) -> Self {
        Self { inductance }
    }

    pub fn impedance(&self, omega: f64) -> Complex64 {
        Complex64::new(0.0, omega * self.inductance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resistor_impedance() {
        let r = Resistor::new(1000.0);
        assert_eq!(r.impedance(0.0), Complex64::new(1000.0, 0.0));
        assert_eq!(r.impedance(377.0), Complex64::new(1000.0, 0.0));
    }

    #[test]
    fn test_capacitor_impedance() {
        let c = Capacitor::new(1e-6);
        // 1/(jωC) at ω = 1000 rad/s is -j·1000 Ω
        let z = c.impedance(1000.0);
        assert_relative_eq!(z.re, 0.0);
        assert_relative_eq!(z.im, -1000.0, epsilon = 1e-9);

        // Blocks at DC
        assert_eq!(c.impedance(0.0).re, OPEN_CIRCUIT_IMPEDANCE);
    }

    #[test]
    fn test_inductor_impedance() {
        let l = Inductor::new(0.5);
        assert_eq!(l.impedance(0.0), Complex64::default());
        assert_relative_eq!(l.impedance(200.0).im, 100.0);
    }
}
