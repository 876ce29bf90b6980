//! Front-end state for live simulation sessions
//!
//! Renderer-agnostic: terminal and GUI front ends both drive this and draw
//! from it. Nothing here is read by the solver.

use std::collections::VecDeque;

use crate::core::types::{ProbeId, Tick};
use crate::interaction::InteractionEvent;

/// Maximum event log entries to keep
const MAX_LOG_ENTRIES: usize = 50;

/// Session UI state
#[derive(Debug, Default)]
pub struct LabUi {
    /// Currently selected probe (if any)
    pub selected_probe: Option<ProbeId>,
    /// Interaction/lifecycle event log
    pub event_log: VecDeque<LogEntry>,
    /// Vertex the placement cursor sits on
    pub cursor_vertex: usize,
    /// Whether to show the probe panel
    pub show_probe_panel: bool,
}

/// An entry in the event log
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub tick: Tick,
    pub message: String,
    pub category: LogCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Interaction,
    Lifecycle,
    Solver,
}

impl LabUi {
    pub fn new() -> Self {
        Self {
            selected_probe: None,
            event_log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            cursor_vertex: 0,
            show_probe_panel: true,
        }
    }

    /// Add an entry to the event log
    pub fn log(&mut self, tick: Tick, message: String, category: LogCategory) {
        if self.event_log.len() >= MAX_LOG_ENTRIES {
            self.event_log.pop_front();
        }
        self.event_log.push_back(LogEntry {
            tick,
            message,
            category,
        });
    }

    /// Log everything the controller did this frame
    pub fn record_events(&mut self, tick: Tick, events: &[InteractionEvent]) {
        for event in events {
            let message = match event {
                InteractionEvent::ToggledAll { active, count } => {
                    let state = if *active { "on" } else { "off" };
                    format!("toggled {} probe(s) {}", count, state)
                }
                InteractionEvent::DestroyedAll { count } => {
                    format!("destroyed {} probe(s)", count)
                }
                InteractionEvent::PowerAdjusted { delta } => {
                    format!("power {:+.2} mV", delta)
                }
            };
            self.log(tick, message, LogCategory::Interaction);
        }
    }

    /// Move the placement cursor, clamped to the domain
    pub fn move_cursor(&mut self, delta: i64, vertex_count: usize) {
        if vertex_count == 0 {
            return;
        }
        let max = (vertex_count - 1) as i64;
        let next = (self.cursor_vertex as i64 + delta).clamp(0, max);
        self.cursor_vertex = next as usize;
    }

    /// Select a probe by ID
    pub fn select(&mut self, probe_id: ProbeId) {
        self.selected_probe = Some(probe_id);
    }

    /// Clear selection
    pub fn deselect(&mut self) {
        self.selected_probe = None;
    }

    /// Toggle selection
    pub fn toggle_select(&mut self, probe_id: ProbeId) {
        if self.selected_probe == Some(probe_id) {
            self.deselect();
        } else {
            self.select(probe_id);
        }
    }
}
