//! A network shared between an editing thread and its readers.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::snapshot::NetworkSnapshot;
use super::state::Network;
use crate::error::Result;

/// One exclusive lock around the whole network.
///
/// Edits, frequency registry updates and `evaluate` each hold the lock for
/// their full duration. Readers that sample waveforms on their own cadence
/// take a [`NetworkSnapshot`] and release the lock immediately.
#[derive(Debug, Clone, Default)]
pub struct SharedNetwork {
    inner: Arc<Mutex<Network>>,
}

impl SharedNetwork {
    pub fn new(network: Network) -> Self {
        Self {
            inner: Arc::new(Mutex::new(network)),
        }
    }

    /// Lock the network.
    pub fn lock(&self) -> MutexGuard<'_, Network> {
        self.inner.lock()
    }

    /// Run `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut Network) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn evaluate(&self, force: bool) -> Result<()> {
        self.inner.lock().evaluate(force)
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().is_valid()
    }

    /// Evaluate if needed and copy out the solution in one critical section.
    pub fn snapshot(&self) -> Result<NetworkSnapshot> {
        let mut network = self.inner.lock();
        network.evaluate(false)?;
        network.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentKind, ComponentSpec, DcVoltageSource, Resistor};
    use crate::graph::Point;
    use std::thread;

    #[test]
    fn test_snapshot_from_reader_thread() {
        let shared = SharedNetwork::default();
        let (src, _) = shared.with(|net| {
            let src = net
                .add_component(ComponentSpec::new(
                    ComponentKind::DcVoltageSource(DcVoltageSource::new(4.0)),
                    Point::new(0.0, 0.0),
                    Point::new(0.0, 1.0),
                ))
                .unwrap();
            let r = net
                .add_component(ComponentSpec::new(
                    ComponentKind::Resistor(Resistor::new(2.0)),
                    Point::new(0.0, 1.0),
                    Point::new(0.0, 0.0),
                ))
                .unwrap();
            (src, r)
        });

        let reader = shared.clone();
        let snapshot = thread::spawn(move || reader.snapshot().unwrap())
            .join()
            .unwrap();
        assert!(snapshot.valid);
        assert!((snapshot.current_at(src, 0.0).unwrap() - 2.0).abs() < 1e-9);
        // The snapshot evaluated the shared network in place
        assert!(!shared.lock().is_dirty());
    }
}
