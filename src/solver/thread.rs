//! Solver thread ownership
//!
//! One solve loop per simulation instance: read the active clamps, read
//! the latest published snapshot, compute the next one, publish, repeat
//! until cancelled. Cancellation is cooperative and checked at iteration
//! boundaries, so a stopping solver never tears a publish and never exits
//! holding the probe-set guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::buffer::ValueBuffer;
use crate::core::error::Result;
use crate::core::types::FieldState;
use crate::probe::SharedProbes;
use crate::solver::{SolverError, SolverStep};

/// Cooperative cancellation flag shared with the solve loop
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Everything the solve loop needs from its owner
pub struct SolverContext {
    pub buffer: Arc<ValueBuffer>,
    pub probes: SharedProbes,
    /// Starting point for the first iteration when nothing has been
    /// published yet; on restart the latest published snapshot wins.
    pub initial: Arc<FieldState>,
    /// Optional pacing between iterations; `None` free-runs
    pub step_interval: Option<Duration>,
}

/// Handle to a running solver thread
///
/// Exactly one exists per running simulation. Dropping it without calling
/// [`SolverHandle::stop`] would detach the thread, so the lifecycle owner
/// always stops through the handle.
pub struct SolverHandle {
    token: CancelToken,
    fault: Arc<Mutex<Option<SolverError>>>,
    thread: JoinHandle<Box<dyn SolverStep>>,
}

impl SolverHandle {
    /// Cancel the loop and wait for its clean exit
    ///
    /// Returns the solver instance so a later start can reuse it. The
    /// transition is only complete once this returns: no publish happens
    /// afterward.
    pub fn stop(self) -> Box<dyn SolverStep> {
        self.token.cancel();
        match self.thread.join() {
            Ok(solver) => solver,
            // The loop itself never panics; a panic here comes from solver
            // code and is propagated to the owner.
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// The fault that stopped the loop, if any
    pub fn fault(&self) -> Option<SolverError> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the loop has already exited (cancelled or faulted)
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Launch the solve loop on its own thread
pub fn spawn_solver(mut solver: Box<dyn SolverStep>, ctx: SolverContext) -> Result<SolverHandle> {
    let token = CancelToken::new();
    let fault: Arc<Mutex<Option<SolverError>>> = Arc::new(Mutex::new(None));

    let loop_token = token.clone();
    let loop_fault = Arc::clone(&fault);

    let thread = std::thread::Builder::new()
        .name("solver".into())
        .spawn(move || {
            tracing::info!("solver thread started");
            let mut iterations: u64 = 0;

            loop {
                if loop_token.is_cancelled() {
                    break;
                }

                // Short critical section: gather the clamp snapshot only.
                let clamps = ctx.probes.lock().active_clamps();

                let prev = ctx
                    .buffer
                    .latest()
                    .unwrap_or_else(|| Arc::clone(&ctx.initial));

                match solver.step(&prev, &clamps) {
                    Ok(next) => {
                        ctx.buffer.publish(next);
                        iterations += 1;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "solver fault, loop exiting");
                        *loop_fault.lock().unwrap_or_else(PoisonError::into_inner) =
                            Some(err);
                        break;
                    }
                }

                if let Some(interval) = ctx.step_interval {
                    std::thread::sleep(interval);
                }
            }

            tracing::info!(iterations, "solver thread exiting");
            solver
        })?;

    Ok(SolverHandle {
        token,
        fault,
        thread,
    })
}
