//! Voltage and current sources.
//!
//! Every source is described by its spectrum: the phasors it contributes,
//! each paired with the angular frequency it sits at. A phasor `X` at `ω`
//! stands for the waveform `Re(X·e^{jωt})`, so `A·cos(ωt + φ)` is the phasor
//! `A·e^{jφ}`.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::MAX_SQUARE_HARMONICS;

/// Constant voltage source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcVoltageSource {
    pub voltage: f64,
}

impl DcVoltageSource {
    pub fn new(voltage: f64) -> Self {
        Self { voltage }
    }

    /// DC phasor.
    pub fn phasor(&self) -> Complex64 {
        Complex64::new(self.voltage, 0.0)
    }
}

/// Sinusoidal source `amplitude·cos(angular_frequency·t + phase)`.
///
/// Shared by the AC voltage and AC current sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sinusoid {
    pub amplitude: f64,
    pub angular_frequency: f64,
    pub phase: f64,
}

impl Sinusoid {
    pub fn new(amplitude: f64, angular_frequency: f64, phase: f64) -> Self {
        Self {
            amplitude,
            angular_frequency,
            phase,
        }
    }

    /// Phasor at `angular_frequency`.
    pub fn phasor(&self) -> Complex64 {
        Complex64::from_polar(self.amplitude, self.phase)
    }

    pub fn frequencies(&self) -> Vec<f64> {
        vec![self.angular_frequency]
    }
}

/// Band-limited square wave built from its odd harmonics.
///
/// `f(t) = 4A/π · Σ sin(nωt)/n` for `n = 1, 3, …, 2·harmonics - 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareVoltageSource {
    pub amplitude: f64,
    pub angular_frequency: f64,
    pub harmonics: usize,
}

impl SquareVoltageSource {
    pub fn new(amplitude: f64, angular_frequency: f64, harmonics: usize) -> Self {
        Self {
            amplitude,
            angular_frequency,
            harmonics: harmonics.clamp(1, MAX_SQUARE_HARMONICS),
        }
    }

    fn orders(&self) -> impl Iterator<Item = usize> {
        (0..self.harmonics).map(|k| 2 * k + 1)
    }

    /// Odd harmonics and their phasors, fundamental first.
    pub fn spectrum(&self) -> Vec<(f64, Complex64)> {
        self.orders()
            .map(|n| {
                let n = n as f64;
                // sin(x) = Re(-j·e^{jx})
                (n * self.angular_frequency, Complex64::new(0.0, -4.0 * self.amplitude / (PI * n)))
            })
            .collect()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.spectrum().into_iter().map(|(omega, _)| omega).collect()
    }
}

/// Constant current source, pushing `current` from its input to its output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcCurrentSource {
    pub current: f64,
}

impl DcCurrentSource {
    pub fn new(current: f64) -> Self {
        Self { current }
    }

    /// DC phasor.
    pub fn phasor(&self) -> Complex64 {
        Complex64::new(self.current, 0.0)
    }
}
