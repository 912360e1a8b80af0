//! Reference-counted registry of simulated angular frequencies.
//!
//! Slots are kept in ascending order with DC permanently at slot 0; only
//! finite, non-negative frequencies are accepted. A slot is shared by every
//! holder that requested the same frequency (within the registry's
//! tolerance, [`FREQUENCY_EPSILON`] by default) and disappears as soon as its
//! last holder releases it, shifting every higher slot down by one. Holders
//! therefore keep the angular frequency, not the slot index, and re-resolve
//! it before use.

use num_complex::Complex64;

use crate::error::{NetworkError, Result};

/// Two angular frequencies closer than this share a slot.
pub const FREQUENCY_EPSILON: f64 = 1e-9;

/// Only finite, non-negative angular frequencies can be simulated.
pub fn check_angular_frequency(omega: f64) -> Result<()> {
    if omega.is_finite() && omega >= 0.0 {
        Ok(())
    } else {
        Err(NetworkError::InvalidFrequency { omega })
    }
}

/// Outcome of a registry update that the graph must mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    /// An existing slot gained or lost a holder
    Unchanged(usize),
    /// A new slot was opened at this index
    Inserted(usize),
    /// The slot at this index was removed
    Removed(usize),
}

/// Sorted angular frequencies paired with their holder counts.
#[derive(Debug, Clone)]
pub struct FrequencyRegistry {
    omegas: Vec<f64>,
    refcounts: Vec<usize>,
    epsilon: f64,
}

impl Default for FrequencyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyRegistry {
    /// Create a registry holding only the DC slot.
    pub fn new() -> Self {
        Self::with_epsilon(FREQUENCY_EPSILON)
    }

    /// Create a registry with a custom matching tolerance.
    ///
    /// Zero, negative and NaN tolerances all mean exact matching.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            omegas: vec![0.0],
            refcounts: vec![1],
            epsilon: epsilon.max(0.0),
        }
    }


    /// Number of slots.
    pub fn len(&self) -> usize {
        self.omegas.len()
    }

    /// Always false: DC is never released.
    pub fn is_empty(&self) -> bool {
        self.omegas.is_empty()
    }

    /// All angular frequencies in slot order.
    pub fn angular_frequencies(&self) -> &[f64] {
        &self.omegas
    }

    /// Holder count of a slot.
    pub fn refcount(&self, slot: usize) -> Option<usize> {
        self.refcounts.get(slot).copied()
    }

    /// Resolve an angular frequency to its current slot.
    pub fn index_of(&self, omega: f64) -> Option<usize> {
        self.omegas.iter().position(|&w| (w - omega).abs() <= self.epsilon)
    }

    /// Sum `(ω, phasor)` pairs into the slots holding their frequencies.
    ///
    /// Contributions whose frequencies share a slot add up.
    pub fn gather(&self, spectrum: &[(f64, Complex64)]) -> Result<Vec<Complex64>> {
        let mut phasors = vec![Complex64::default(); self.len()];
        for &(omega, phasor) in spectrum {
            let slot = self
                .index_of(omega)
                .ok_or(NetworkError::UnknownFrequency { omega })?;
            phasors[slot] += phasor;
        }
        Ok(phasors)
    }

    /// Register one more holder of `omega`, opening a slot if needed.
    pub fn request(&mut self, omega: f64) -> Result<SlotChange> {
        check_angular_frequency(omega)?;
        if let Some(slot) = self.index_of(omega) {
            self.refcounts[slot] += 1;
            return Ok(SlotChange::Unchanged(slot));
        }
        // Non-negative, so DC stays in front
        let slot = self.omegas.partition_point(|&w| w < omega);
        self.omegas.insert(slot, omega);
        self.refcounts.insert(slot, 1);
        Ok(SlotChange::Inserted(slot))
    }

    /// Drop one holder of `omega`, removing the slot when none remain.
    pub fn release(&mut self, omega: f64) -> Result<SlotChange> {
        let slot = self
            .index_of(omega)
            .ok_or(NetworkError::UnknownFrequency { omega })?;
        if slot == 0 && self.refcounts[0] == 1 {
            return Err(NetworkError::DcRelease);
        }
        self.refcounts[slot] -= 1;
        if self.refcounts[slot] > 0 {
            return Ok(SlotChange::Unchanged(slot));
        }
        self.omegas.remove(slot);
        self.refcounts.remove(slot);
        Ok(SlotChange::Removed(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_always_present() {
        let mut reg = FrequencyRegistry::new();
        assert_eq!(reg.angular_frequencies(), &[0.0]);
        assert!(matches!(reg.release(0.0), Err(NetworkError::DcRelease)));

        // Extra DC holders come and go without touching the permanent one
        assert_eq!(reg.request(0.0).unwrap(), SlotChange::Unchanged(0));
        assert_eq!(reg.release(0.0).unwrap(), SlotChange::Unchanged(0));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_sorted_insertion() {
        let mut reg = FrequencyRegistry::new();
        assert_eq!(reg.request(300.0).unwrap(), SlotChange::Inserted(1));
        assert_eq!(reg.request(100.0).unwrap(), SlotChange::Inserted(1));
        assert_eq!(reg.request(200.0).unwrap(), SlotChange::Inserted(2));
        assert_eq!(reg.angular_frequencies(), &[0.0, 100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_refcount_release_shifts_slots() {
        let mut reg = FrequencyRegistry::new();
        reg.request(300.0).unwrap();
        for _ in 0..3 {
            reg.request(100.0 + 1e-12).unwrap();
        }
        assert_eq!(reg.refcount(1), Some(3));

        assert_eq!(reg.release(100.0).unwrap(), SlotChange::Unchanged(1));
        assert_eq!(reg.release(100.0).unwrap(), SlotChange::Unchanged(1));
        assert_eq!(reg.index_of(300.0), Some(2));

        assert_eq!(reg.release(100.0).unwrap(), SlotChange::Removed(1));
        assert_eq!(reg.index_of(100.0), None);
        assert_eq!(reg.index_of(300.0), Some(1));
    }

    #[test]
    fn test_release_unknown() {
        let mut reg = FrequencyRegistry::new();
        assert!(matches!(
            reg.release(42.0),
            Err(NetworkError::UnknownFrequency { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let mut reg = FrequencyRegistry::new();
        reg.request(50.0).unwrap();
        for omega in [-50.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                reg.request(omega),
                Err(NetworkError::InvalidFrequency { .. })
            ));
        }
        assert_eq!(reg.angular_frequencies(), &[0.0, 50.0]);
        assert_eq!(reg.refcount(0), Some(1));
    }

    #[test]
    fn test_zero_epsilon_matches_exactly() {
        for epsilon in [0.0, -1.0, f64::NAN] {
            let mut reg = FrequencyRegistry::with_epsilon(epsilon);
            assert_eq!(reg.request(50.0).unwrap(), SlotChange::Inserted(1));
            assert_eq!(reg.request(50.0).unwrap(), SlotChange::Unchanged(1));
            assert_eq!(reg.request(50.5).unwrap(), SlotChange::Inserted(2));
            assert_eq!(reg.release(50.0).unwrap(), SlotChange::Unchanged(1));
            assert_eq!(reg.release(50.0).unwrap(), SlotChange::Removed(1));
        }
    }

    #[test]
    fn test_gather_sums_shared_slots() {
        let mut reg = FrequencyRegistry::with_epsilon(1.0);
        reg.request(50.0).unwrap();
        assert_eq!(reg.request(50.5).unwrap(), SlotChange::Unchanged(1));

        let one = Complex64::new(1.0, 0.0);
        let phasors = reg.gather(&[(0.0, one), (50.0, one), (50.5, one)]).unwrap();
        assert_eq!(phasors, vec![one, Complex64::new(2.0, 0.0)]);
        assert!(matches!(
            reg.gather(&[(80.0, one)]),
            Err(NetworkError::UnknownFrequency { .. })
        ));
    }
}
