//! Time-domain projection of phasor vectors.

use num_complex::Complex64;

/// Instantaneous value `Σ_k Re(X[k]·e^{jω[k]·t})`.
pub fn project(phasors: &[Complex64], omegas: &[f64], t: f64) -> f64 {
    phasors
        .iter()
        .zip(omegas)
        .map(|(x, &w)| term(*x, w, t))
        .sum()
}

/// Like [`project`], restricted to the listed slots. Out-of-range slots are
/// ignored.
pub fn project_subset(phasors: &[Complex64], omegas: &[f64], slots: &[usize], t: f64) -> f64 {
    slots
        .iter()
        .filter_map(|&k| Some(term(*phasors.get(k)?, *omegas.get(k)?, t)))
        .sum()
}

fn term(x: Complex64, omega: f64, t: f64) -> f64 {
    (x * Complex64::from_polar(1.0, omega * t)).re
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_dc_plus_cosine() {
        let x = [Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)];
        let w = [0.0, PI];
        assert_relative_eq!(project(&x, &w, 0.0), 3.0);
        assert_relative_eq!(project(&x, &w, 1.0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_shift() {
        // -j at ω is sin(ωt)
        let x = [Complex64::new(0.0, -1.0)];
        assert_relative_eq!(project(&x, &[2.0], PI / 4.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_subset() {
        let x = [Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0), Complex64::new(4.0, 0.0)];
        let w = [0.0, 0.0, 0.0];
        assert_relative_eq!(project_subset(&x, &w, &[0, 2], 5.0), 5.0);
        assert_relative_eq!(project_subset(&x, &w, &[1, 9], 5.0), 2.0);
    }
}
