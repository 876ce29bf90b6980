//! Simulation lifecycle: state machine and per-frame foreground tick

mod lifecycle;

pub use lifecycle::{LifecycleState, Simulation, SolverFactory};
