//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for probes (voltage clamps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeId(pub Uuid);

impl ProbeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProbeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a simulation instance
///
/// Hit resolution carries this so probes are never attached to a stale or
/// foreign simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationId(pub Uuid);

impl SimulationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SimulationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulation tick counter (solver time unit)
pub type Tick = u64;

/// Index of a vertex in the active cell geometry
///
/// Carries a designated sentinel meaning "unattached / pending placement".
/// An unattached index must never reach the solver as a boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexIndex(i64);

impl VertexIndex {
    /// Sentinel for a probe target that has not been resolved to a vertex
    pub const UNATTACHED: VertexIndex = VertexIndex(-1);

    /// An index pointing at a real vertex
    pub fn attached(index: usize) -> Self {
        Self(index as i64)
    }

    pub fn is_attached(&self) -> bool {
        self.0 >= 0
    }

    /// The resolved vertex index, or None for the sentinel
    pub fn index(&self) -> Option<usize> {
        if self.0 >= 0 {
            Some(self.0 as usize)
        } else {
            None
        }
    }
}

/// One computed snapshot of the simulated field
///
/// Membrane potential per geometry vertex, in millivolts. Produced
/// exclusively by the solver; shared read-only behind `Arc` once published.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub tick: Tick,
    pub values: Vec<f64>,
}

impl FieldState {
    /// A tick-zero snapshot with every vertex at the same value
    pub fn uniform(vertex_count: usize, value: f64) -> Self {
        Self {
            tick: 0,
            values: vec![value; vertex_count],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, vertex: usize) -> Option<f64> {
        self.values.get(vertex).copied()
    }

    /// (min, max) over all vertices; (0, 0) for an empty field
    pub fn range(&self) -> (f64, f64) {
        if self.values.is_empty() {
            return (0.0, 0.0);
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.values {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        (min, max)
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}
