//! Background solver: step seam, cancellation, and the solve thread
//!
//! The numerical method is deliberately opaque to the rest of the core:
//! anything implementing [`SolverStep`] can be driven by the solve loop.
//! [`CableSolver`] is the reference implementation used by the front end
//! and the test suite.

mod cable;
mod thread;

pub use cable::CableSolver;
pub use thread::{spawn_solver, CancelToken, SolverContext, SolverHandle};

use thiserror::Error;

use crate::core::types::{FieldState, Tick};
use crate::probe::ClampValue;

/// Fatal solver conditions
///
/// A step that fails must not publish; the solve loop records the fault and
/// exits so the lifecycle can force a transition to Stopped instead of
/// publishing invalid state indefinitely.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("solver produced a non-finite value at vertex {vertex} on tick {tick}")]
    Diverged { vertex: usize, tick: Tick },

    #[error("clamp targets vertex {0} outside the domain")]
    ClampOutOfDomain(usize),
}

/// One iteration of the background computation
///
/// Computes the next snapshot from the previous one and the currently
/// active clamps. Implementations run on the solver thread and must not
/// hold references into shared state across calls.
pub trait SolverStep: Send {
    fn step(
        &mut self,
        prev: &FieldState,
        clamps: &[ClampValue],
    ) -> std::result::Result<FieldState, SolverError>;
}
