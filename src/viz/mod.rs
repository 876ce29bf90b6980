//! Visualization collaborator seam
//!
//! The core never renders; it hands snapshots to whatever sink the
//! composition root provides. `build` runs once after data load (skipped
//! entirely under dry-run), `update` once per foreground tick with the
//! latest available snapshot.

use crate::core::types::FieldState;
use crate::geometry::CellGeometry;

pub trait VisualizationSink {
    /// Construct the visualization from the loaded cell
    fn build(&mut self, geometry: &CellGeometry, initial: &FieldState);

    /// Refresh from the latest published snapshot
    fn update(&mut self, state: &FieldState);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl VisualizationSink for NullSink {
    fn build(&mut self, _geometry: &CellGeometry, _initial: &FieldState) {}

    fn update(&mut self, _state: &FieldState) {}
}

/// Logs coarse field statistics through tracing
///
/// Useful for headless runs; emits once every `every` ticks to keep the
/// log readable at solver rates.
#[derive(Debug)]
pub struct TraceSink {
    every: u64,
    last_logged: Option<u64>,
}

impl TraceSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            last_logged: None,
        }
    }
}

impl VisualizationSink for TraceSink {
    fn build(&mut self, geometry: &CellGeometry, initial: &FieldState) {
        tracing::info!(
            vertices = geometry.vertex_count(),
            mean = initial.mean(),
            "visualization ready"
        );
    }

    fn update(&mut self, state: &FieldState) {
        if self.last_logged.is_some_and(|t| state.tick < t + self.every) {
            return;
        }
        self.last_logged = Some(state.tick);
        let (min, max) = state.range();
        tracing::debug!(tick = state.tick, min, max, mean = state.mean(), "field");
    }
}
