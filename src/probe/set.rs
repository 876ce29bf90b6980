//! Ordered probe collection shared by the foreground and the solver
//!
//! Structural mutation (insert/remove) and the solver's full-set iteration
//! are mutually exclusive: both only happen through the `SharedProbes`
//! mutex guard. Critical sections stay short (no recomputation inside) so
//! the solver never stalls on the foreground for long.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::error::{Result, SimError};
use crate::core::types::ProbeId;
use crate::probe::{ClampValue, Probe};

/// Ordered collection of live probes
///
/// Only reachable through a `SharedProbes` guard, so every operation here
/// runs under exclusive access by construction.
#[derive(Debug, Default)]
pub struct ProbeSet {
    probes: Vec<Probe>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a probe; rejects targets that never resolved to a vertex
    pub fn add(&mut self, probe: Probe) -> Result<ProbeId> {
        if !probe.is_attached() {
            return Err(SimError::InvalidProbe(
                "probe target is unattached".into(),
            ));
        }
        let id = probe.id();
        self.probes.push(probe);
        Ok(id)
    }

    /// Remove every probe matching the predicate, returning the count removed
    pub fn remove_all<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&Probe) -> bool,
    {
        let before = self.probes.len();
        self.probes.retain(|p| !predicate(p));
        before - self.probes.len()
    }

    /// Apply `f` to every active probe
    ///
    /// The solver uses this to gather boundary-condition contributions;
    /// the caller's guard guarantees a consistent snapshot of the set.
    pub fn for_each_active<F>(&self, mut f: F)
    where
        F: FnMut(&Probe),
    {
        for probe in self.probes.iter().filter(|p| p.is_active()) {
            f(probe);
        }
    }

    /// The solver's per-step snapshot of (vertex, power) pairs
    pub fn active_clamps(&self) -> Vec<ClampValue> {
        let mut clamps = Vec::new();
        self.for_each_active(|probe| {
            if let Some(vertex) = probe.vertex().index() {
                clamps.push(ClampValue {
                    vertex,
                    power: probe.power(),
                });
            }
        });
        clamps
    }

    /// Uniform power increment on every active probe
    pub fn adjust_power_all(&mut self, delta: f64) {
        for probe in self.probes.iter_mut().filter(|p| p.is_active()) {
            probe.adjust_power(delta);
        }
    }

    /// Idempotent broadcast of the highlighted flag to every probe
    pub fn highlight_all(&mut self, highlighted: bool) {
        for probe in &mut self.probes {
            probe.set_highlighted(highlighted);
        }
    }

    /// Lock-step activation: every probe ends up in the given state
    pub fn set_all_active(&mut self, active: bool) {
        for probe in &mut self.probes {
            probe.set_active(active);
        }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn get(&self, id: ProbeId) -> Option<&Probe> {
        self.probes.iter().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }
}

/// Cloneable handle to the mutex-guarded probe set
///
/// The foreground mutates through it, the solver reads through it; the
/// guard is the exclusive-access discipline the set's contract requires.
#[derive(Debug, Clone, Default)]
pub struct SharedProbes {
    inner: Arc<Mutex<ProbeSet>>,
}

impl SharedProbes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive access to the set
    ///
    /// A poisoned mutex is recovered: the set's invariants hold after any
    /// single operation, so a panicking holder cannot leave it half-mutated.
    pub fn lock(&self) -> MutexGuard<'_, ProbeSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::VertexIndex;

    fn attached_probe(vertex: usize) -> Probe {
        Probe::new(VertexIndex::attached(vertex), -15.0)
    }

    #[test]
    fn test_add_rejects_unattached() {
        let mut set = ProbeSet::new();
        let err = set.add(Probe::new(VertexIndex::UNATTACHED, 0.0));
        assert!(err.is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_all_counts() {
        let mut set = ProbeSet::new();
        for v in 0..4 {
            set.add(attached_probe(v)).expect("attached");
        }
        assert_eq!(set.len(), 4);

        let removed = set.remove_all(|p| p.is_attached());
        assert_eq!(removed, 4);
        assert!(set.is_empty());

        // Removing from an empty set is a no-op
        assert_eq!(set.remove_all(|_| true), 0);
    }

    #[test]
    fn test_active_clamps_skips_inactive() {
        let mut set = ProbeSet::new();
        let a = set.add(attached_probe(0)).expect("attached");
        set.add(attached_probe(1)).expect("attached");

        set.set_all_active(true);
        assert_eq!(set.active_clamps().len(), 2);

        set.set_all_active(false);
        assert!(set.active_clamps().is_empty());

        // Reactivate one directly and check the snapshot content
        set.set_all_active(true);
        let clamps = set.active_clamps();
        assert_eq!(clamps[0].vertex, 0);
        assert_eq!(clamps[0].power, -15.0);
        assert!(set.get(a).expect("present").is_active());
    }

    #[test]
    fn test_adjust_power_only_touches_active() {
        let mut set = ProbeSet::new();
        set.add(attached_probe(0)).expect("attached");
        set.add(attached_probe(1)).expect("attached");
        set.set_all_active(true);

        set.adjust_power_all(5.0);
        for probe in set.iter() {
            assert_eq!(probe.power(), -10.0);
        }

        set.set_all_active(false);
        set.adjust_power_all(5.0);
        for probe in set.iter() {
            assert_eq!(probe.power(), -10.0);
        }
    }

    #[test]
    fn test_highlight_broadcast_is_idempotent() {
        let mut set = ProbeSet::new();
        set.add(attached_probe(0)).expect("attached");

        set.highlight_all(true);
        set.highlight_all(true);
        assert!(set.iter().all(|p| p.is_highlighted()));

        set.highlight_all(false);
        assert!(set.iter().all(|p| !p.is_highlighted()));
    }

    #[test]
    fn test_structural_changes_never_observed_partially() {
        // A reader grabbing the guard between writer batches must only ever
        // see a fully-applied batch: 0 probes or all 5.
        const BATCH: usize = 5;
        let shared = SharedProbes::new();

        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    {
                        let mut set = shared.lock();
                        for v in 0..BATCH {
                            set.add(attached_probe(v)).expect("attached");
                        }
                        set.set_all_active(true);
                    }
                    {
                        let mut set = shared.lock();
                        set.remove_all(|p| p.is_attached());
                    }
                }
            })
        };

        for _ in 0..2000 {
            let mut seen = 0;
            shared.lock().for_each_active(|_| seen += 1);
            assert!(
                seen == 0 || seen == BATCH,
                "observed a partially-mutated set: {} probes",
                seen
            );
        }

        writer.join().expect("writer panicked");
    }
}
