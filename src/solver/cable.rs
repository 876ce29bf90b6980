//! Reference cable solver
//!
//! Explicit-Euler diffusion with a leak toward the resting potential over
//! the branching cable. Clamps are applied as Dirichlet conditions after
//! the field update so they win over diffusion.

use std::sync::Arc;

use crate::core::types::FieldState;
use crate::geometry::CellGeometry;
use crate::probe::ClampValue;
use crate::solver::{SolverError, SolverStep};

/// Diffusion weight per neighbor per step
///
/// Stability requires coupling * max_degree < 1; synthetic cells keep
/// degrees small enough for the default.
const DEFAULT_COUPLING: f64 = 0.1;

/// Per-step pull toward the resting potential
const DEFAULT_LEAK: f64 = 0.01;

const DEFAULT_RESTING: f64 = -65.0;

pub struct CableSolver {
    geometry: Arc<CellGeometry>,
    coupling: f64,
    leak: f64,
    resting: f64,
}

impl CableSolver {
    pub fn new(geometry: Arc<CellGeometry>) -> Self {
        Self {
            geometry,
            coupling: DEFAULT_COUPLING,
            leak: DEFAULT_LEAK,
            resting: DEFAULT_RESTING,
        }
    }

    pub fn with_params(mut self, coupling: f64, leak: f64, resting: f64) -> Self {
        self.coupling = coupling;
        self.leak = leak;
        self.resting = resting;
        self
    }
}

impl SolverStep for CableSolver {
    fn step(
        &mut self,
        prev: &FieldState,
        clamps: &[ClampValue],
    ) -> std::result::Result<FieldState, SolverError> {
        let n = self.geometry.vertex_count();
        let tick = prev.tick + 1;

        let mut next = Vec::with_capacity(n);
        for v in 0..n {
            let u = prev.values[v];
            let mut laplacian = 0.0;
            for &nb in self.geometry.neighbors(v) {
                laplacian += prev.values[nb] - u;
            }
            next.push(u + self.coupling * laplacian + self.leak * (self.resting - u));
        }

        for clamp in clamps {
            if clamp.vertex >= n {
                return Err(SolverError::ClampOutOfDomain(clamp.vertex));
            }
            // Finite power drives the vertex to the clamp target; the
            // hold-at-reference sentinel freezes it at its previous value.
            next[clamp.vertex] = if clamp.power.is_finite() {
                clamp.power
            } else {
                prev.values[clamp.vertex]
            };
        }

        for (vertex, &value) in next.iter().enumerate() {
            if !value.is_finite() {
                return Err(SolverError::Diverged { vertex, tick });
            }
        }

        Ok(FieldState { tick, values: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Arc<CellGeometry> {
        let edges: Vec<[usize; 2]> = (1..n).map(|v| [v - 1, v]).collect();
        Arc::new(CellGeometry::from_edges(n, &edges).expect("valid chain"))
    }

    #[test]
    fn test_unclamped_field_relaxes_to_rest() {
        let mut solver = CableSolver::new(chain(5));
        let mut state = FieldState::uniform(5, 0.0);

        for _ in 0..2000 {
            state = solver.step(&state, &[]).expect("step");
        }

        for &v in &state.values {
            assert!((v - DEFAULT_RESTING).abs() < 0.5, "value {} not at rest", v);
        }
        assert_eq!(state.tick, 2000);
    }

    #[test]
    fn test_finite_clamp_pins_vertex() {
        let mut solver = CableSolver::new(chain(5));
        let mut state = FieldState::uniform(5, -65.0);
        let clamps = [ClampValue {
            vertex: 2,
            power: 20.0,
        }];

        for _ in 0..50 {
            state = solver.step(&state, &clamps).expect("step");
        }

        assert_eq!(state.values[2], 20.0);
        // The clamp leaks into the neighborhood
        assert!(state.values[1] > -65.0);
        assert!(state.values[3] > -65.0);
    }

    #[test]
    fn test_hold_at_reference_freezes_vertex() {
        let mut solver = CableSolver::new(chain(3));
        let initial = FieldState {
            tick: 0,
            values: vec![-65.0, 10.0, -65.0],
        };
        let clamps = [ClampValue {
            vertex: 1,
            power: f64::INFINITY,
        }];

        let mut state = initial.clone();
        for _ in 0..20 {
            state = solver.step(&state, &clamps).expect("step");
        }

        assert_eq!(state.values[1], 10.0, "held vertex must not move");
        assert!(state.values[0] > -65.0, "held value still diffuses outward");
    }

    #[test]
    fn test_divergence_is_detected() {
        let mut solver = CableSolver::new(chain(2)).with_params(1.0, 0.0, -65.0);
        let state = FieldState {
            tick: 0,
            values: vec![f64::MAX, f64::MIN],
        };

        let err = solver.step(&state, &[]).expect_err("must diverge");
        assert!(matches!(err, SolverError::Diverged { .. }));
    }

    #[test]
    fn test_out_of_domain_clamp_is_fatal() {
        let mut solver = CableSolver::new(chain(3));
        let state = FieldState::uniform(3, -65.0);
        let clamps = [ClampValue {
            vertex: 9,
            power: 0.0,
        }];

        assert_eq!(
            solver.step(&state, &clamps),
            Err(SolverError::ClampOutOfDomain(9))
        );
    }
}
