//! The simulation lifecycle owner
//!
//! Owns the shared buffer, the probe set, and the solver thread, and walks
//! the state machine: initialize -> Running -> (pause/resume)* -> Stopped.
//! Host application events (suspend, quit) map onto the same cancellation
//! path, and dropping the owner cancels too: no solver thread ever
//! outlives its simulation instance.

use std::sync::Arc;

use crate::buffer::ValueBuffer;
use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{FieldState, SimulationId};
use crate::geometry::{CellGeometry, DataLoader};
use crate::interaction::{InputSample, InteractionController, InteractionEvent};
use crate::probe::SharedProbes;
use crate::solver::{spawn_solver, SolverContext, SolverError, SolverHandle, SolverStep};
use crate::viz::VisualizationSink;

/// Lifecycle phase of a simulation instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Running,
    Paused,
    /// Terminal; no transition leaves Stopped
    Stopped,
}

/// Builds the solver once the geometry is known
pub type SolverFactory = Box<dyn FnOnce(Arc<CellGeometry>) -> Box<dyn SolverStep>>;

/// A live simulation instance
pub struct Simulation {
    id: SimulationId,
    config: SimConfig,
    state: LifecycleState,

    loader: Box<dyn DataLoader>,
    viz: Box<dyn VisualizationSink>,
    make_solver: Option<SolverFactory>,

    geometry: Option<Arc<CellGeometry>>,
    initial: Option<Arc<FieldState>>,
    buffer: Arc<ValueBuffer>,
    probes: SharedProbes,
    controller: Option<InteractionController>,

    /// Parked solver instance between runs
    solver: Option<Box<dyn SolverStep>>,
    handle: Option<SolverHandle>,
    last_fault: Option<SolverError>,
}

impl Simulation {
    pub fn new(
        config: SimConfig,
        loader: Box<dyn DataLoader>,
        viz: Box<dyn VisualizationSink>,
        make_solver: SolverFactory,
    ) -> Result<Self> {
        config.validate().map_err(SimError::Config)?;
        Ok(Self {
            id: SimulationId::new(),
            config,
            state: LifecycleState::Uninitialized,
            loader,
            viz,
            make_solver: Some(make_solver),
            geometry: None,
            initial: None,
            buffer: Arc::new(ValueBuffer::new()),
            probes: SharedProbes::new(),
            controller: None,
            solver: None,
            handle: None,
            last_fault: None,
        })
    }

    pub fn id(&self) -> SimulationId {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The shared snapshot buffer; front ends read the latest state here
    pub fn buffer(&self) -> Arc<ValueBuffer> {
        Arc::clone(&self.buffer)
    }

    pub fn probes(&self) -> SharedProbes {
        self.probes.clone()
    }

    pub fn geometry(&self) -> Option<&Arc<CellGeometry>> {
        self.geometry.as_ref()
    }

    /// The interaction controller, present once initialized unless dry-run
    pub fn controller_mut(&mut self) -> Option<&mut InteractionController> {
        self.controller.as_mut()
    }

    /// The fault that forced the last stop, if any
    pub fn last_fault(&self) -> Option<&SolverError> {
        self.last_fault.as_ref()
    }

    /// Load data and bring the simulation up
    ///
    /// Runs the data loader synchronously; on failure the lifecycle stays
    /// in Initializing and the error is surfaced. On success builds the
    /// visualization and interaction (skipped under dry-run), advances to
    /// Running, and launches the solver when `start_on_awake` is set.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::Initializing => {}
            _ => {
                return Err(SimError::InvalidTransition(
                    "initialize is only valid before the simulation is up",
                ))
            }
        }
        self.state = LifecycleState::Initializing;

        let loaded = self.loader.read_data()?;
        let geometry = Arc::new(loaded.geometry);
        let initial = Arc::new(loaded.initial);

        if initial.len() != geometry.vertex_count() {
            return Err(SimError::Config(format!(
                "initial state has {} values for {} vertices",
                initial.len(),
                geometry.vertex_count()
            )));
        }

        if !self.config.dry_run {
            self.viz.build(&geometry, &initial);
            self.controller = Some(InteractionController::new(
                self.id,
                geometry.vertex_count(),
                self.probes.clone(),
                &self.config,
            ));
        }

        let make_solver = self
            .make_solver
            .take()
            .ok_or(SimError::InvalidTransition("solver already constructed"))?;
        self.solver = Some(make_solver(Arc::clone(&geometry)));

        tracing::info!(
            sim = %self.id.0,
            vertices = geometry.vertex_count(),
            dry_run = self.config.dry_run,
            "simulation initialized"
        );

        self.geometry = Some(geometry);
        self.initial = Some(initial);
        self.state = LifecycleState::Running;

        if self.config.start_on_awake {
            self.start_simulation()?;
        }
        Ok(())
    }

    /// Launch the solver thread, restarting it if one is already running
    ///
    /// Callable any time after initialization while not Stopped. A running
    /// solver is fully cancelled before the fresh one spawns, so two
    /// threads never race to publish.
    pub fn start_simulation(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::Initializing => {
                return Err(SimError::NotInitialized)
            }
            LifecycleState::Stopped => {
                return Err(SimError::InvalidTransition(
                    "cannot start a stopped simulation",
                ))
            }
            LifecycleState::Running | LifecycleState::Paused => {}
        }

        self.cancel_solver();

        let solver = self.solver.take().ok_or(SimError::NotInitialized)?;
        let initial = self
            .initial
            .as_ref()
            .map(Arc::clone)
            .ok_or(SimError::NotInitialized)?;

        let handle = spawn_solver(
            solver,
            SolverContext {
                buffer: Arc::clone(&self.buffer),
                probes: self.probes.clone(),
                initial,
                step_interval: self.config.step_interval(),
            },
        )?;
        self.handle = Some(handle);
        self.state = LifecycleState::Running;
        tracing::info!(sim = %self.id.0, "solver launched");
        Ok(())
    }

    /// Cancel the solver and hold at the last published snapshot
    pub fn pause(&mut self) -> Result<()> {
        if self.state != LifecycleState::Running {
            return Err(SimError::InvalidTransition("pause requires Running"));
        }
        self.cancel_solver();
        self.state = LifecycleState::Paused;
        tracing::info!(sim = %self.id.0, "simulation paused");
        Ok(())
    }

    /// Spawn a fresh solver continuing from the last published snapshot
    pub fn resume(&mut self) -> Result<()> {
        if self.state != LifecycleState::Paused {
            return Err(SimError::InvalidTransition("resume requires Paused"));
        }
        self.start_simulation()?;
        tracing::info!(sim = %self.id.0, "simulation resumed");
        Ok(())
    }

    /// Cancel the solver and terminate the lifecycle
    ///
    /// Idempotent; Stopped is terminal.
    pub fn stop(&mut self) {
        self.cancel_solver();
        if self.state != LifecycleState::Stopped {
            self.state = LifecycleState::Stopped;
            tracing::info!(sim = %self.id.0, "simulation stopped");
        }
    }

    /// Host application suspend/resume notification
    ///
    /// Suspension tears the solver down through the normal pause path;
    /// un-suspending is left to an explicit `resume` by the host.
    pub fn on_application_pause(&mut self, paused: bool) {
        if paused && self.state == LifecycleState::Running {
            // Cannot fail from Running
            let _ = self.pause();
        }
    }

    /// Host application quit notification
    pub fn on_application_quit(&mut self) {
        self.stop();
    }

    /// One foreground frame
    ///
    /// Polls for a solver fault (which forces Stopped), feeds the input
    /// sample to the interaction controller, and pushes the latest
    /// snapshot to the visualization sink. Under dry-run only the fault
    /// poll runs.
    pub fn frame_tick(&mut self, sample: InputSample) -> Vec<InteractionEvent> {
        self.poll_fault();

        let events = match self.controller.as_mut() {
            Some(controller) => controller.tick(sample),
            None => Vec::new(),
        };

        if !self.config.dry_run {
            if let Some(state) = self.buffer.latest() {
                self.viz.update(&state);
            }
        }

        events
    }

    /// Check whether the solver loop died on a fault; if so, force Stopped
    pub fn poll_fault(&mut self) -> Option<SolverError> {
        let fault = self.handle.as_ref().and_then(|h| h.fault());
        if let Some(err) = fault {
            tracing::error!(sim = %self.id.0, error = %err, "solver fault forced stop");
            self.stop();
            return Some(err);
        }
        None
    }

    /// Cancel and join the solver thread, parking the instance for reuse
    fn cancel_solver(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(err) = handle.fault() {
                self.last_fault = Some(err);
            }
            self.solver = Some(handle.stop());
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.cancel_solver();
    }
}
