//! Interaction gesture logic
//!
//! Accumulates hold duration on the toggle/destroy control, dispatches the
//! release into toggle-all or destroy-all, applies power adjustment and
//! the highlight broadcast, and attaches new probes from resolved hits.
//! All probe mutation for one tick happens inside a single acquisition of
//! the shared set, so commands issued in the same tick land in issue order.

use crate::core::config::SimConfig;
use crate::core::types::{ProbeId, SimulationId, VertexIndex};
use crate::interaction::mode::InteractionMode;
use crate::interaction::InputSample;
use crate::probe::{Probe, ProbeSet, SharedProbes};

/// A user gesture resolved to a vertex by the external hit subsystem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The simulation instance the ray hit
    pub sim: SimulationId,
    /// Resolved target vertex, or the unattached sentinel on a miss
    pub vertex: VertexIndex,
}

/// Commands the controller applied this tick, for the front-end event log
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// Every probe flipped to the given activation state
    ToggledAll { active: bool, count: usize },
    /// Bulk destroy fired after a long hold
    DestroyedAll { count: usize },
    /// Uniform power change applied to the active probes (millivolts)
    PowerAdjusted { delta: f64 },
}

/// Per-frame input interpreter and probe mutator
///
/// Constructed with the owning simulation's identity and domain size, so
/// hits on stale or foreign instances are rejected without consulting any
/// global state.
pub struct InteractionController {
    probes: SharedProbes,
    sim: SimulationId,
    vertex_count: usize,
    mode: InteractionMode,

    destroy_threshold: u32,
    power_step: f64,
    placement_power: f64,

    hold_count: u32,
    power_click: bool,
    all_active: bool,
    hit_streak: u32,
}

impl InteractionController {
    pub fn new(
        sim: SimulationId,
        vertex_count: usize,
        probes: SharedProbes,
        config: &SimConfig,
    ) -> Self {
        Self {
            probes,
            sim,
            vertex_count,
            mode: config.interaction_mode,
            destroy_threshold: config.destroy_threshold,
            power_step: config.power_step(),
            placement_power: config.placement_power(),
            hold_count: 0,
            power_click: false,
            all_active: false,
            hit_streak: 0,
        }
    }

    /// Interpret one frame of input
    ///
    /// While the toggle control is held the hold counter grows; the tick
    /// after it releases dispatches the gesture. Highlighting and power
    /// adjustment are applied every tick independent of the hold logic.
    pub fn tick(&mut self, sample: InputSample) -> Vec<InteractionEvent> {
        let mut events = Vec::new();
        let probes = self.probes.clone();
        let mut set = probes.lock();

        if sample.toggle_pressed {
            self.hold_count += 1;
        } else {
            self.dispatch_release(&mut set, &mut events);
        }

        set.highlight_all(sample.highlight_pressed);

        let delta = sample.power_delta * self.power_step;
        if delta != 0.0 {
            // A power adjustment during the hold claims the gesture: the
            // eventual release must not also toggle or destroy.
            self.power_click = true;
            set.adjust_power_all(delta);
            events.push(InteractionEvent::PowerAdjusted { delta });
        }

        events
    }

    /// End-of-session path: flush any pending gesture, clear highlights
    pub fn reset(&mut self) -> Vec<InteractionEvent> {
        let mut events = Vec::new();
        let probes = self.probes.clone();
        let mut set = probes.lock();
        self.dispatch_release(&mut set, &mut events);
        set.highlight_all(false);
        self.hit_streak = 0;
        events
    }

    fn dispatch_release(&mut self, set: &mut ProbeSet, events: &mut Vec<InteractionEvent>) {
        if !self.power_click {
            if self.hold_count >= self.destroy_threshold {
                let count = set.remove_all(|p| p.is_attached());
                if count > 0 {
                    events.push(InteractionEvent::DestroyedAll { count });
                }
            } else if self.hold_count > 0 && !set.is_empty() {
                let active = !self.all_active;
                set.set_all_active(active);
                self.all_active = active;
                events.push(InteractionEvent::ToggledAll {
                    active,
                    count: set.len(),
                });
            }
        }

        self.hold_count = 0;
        self.power_click = false;
    }

    /// Attach a new probe from a resolved hit
    ///
    /// A miss is harmless: hits on a foreign simulation, on the unattached
    /// sentinel, or outside the domain are swallowed and nothing changes.
    pub fn instantiate_probe(&mut self, hit: RaycastHit) -> Option<ProbeId> {
        if hit.sim != self.sim {
            tracing::debug!("hit belongs to another simulation instance, ignoring");
            return None;
        }

        let admitted = self.mode.strategy().admits(self.hit_streak > 0);
        self.hit_streak += 1;
        if !admitted {
            return None;
        }

        let Some(index) = hit.vertex.index() else {
            tracing::debug!("hit did not resolve to a vertex, ignoring");
            return None;
        };
        if index >= self.vertex_count {
            tracing::debug!(vertex = index, "hit outside the domain, ignoring");
            return None;
        }

        let mut probe = Probe::new(hit.vertex, self.placement_power);
        // Match the group's current toggle direction so lock-step toggling
        // stays uniform across probes placed at different times.
        probe.set_active(self.all_active);

        let mut set = self.probes.lock();
        match set.add(probe) {
            Ok(id) => {
                tracing::debug!(vertex = index, "probe placed");
                Some(id)
            }
            Err(err) => {
                tracing::debug!(error = %err, "probe rejected");
                None
            }
        }
    }

    /// The placement gesture released; the next hit starts a new gesture
    pub fn hit_released(&mut self) {
        self.hit_streak = 0;
    }

    /// Ticks the toggle control has been held in the current gesture
    pub fn held_ticks(&self) -> u32 {
        self.hold_count
    }

    /// Whether a power adjustment has claimed the current gesture
    pub fn power_claimed(&self) -> bool {
        self.power_click
    }

    /// Current lock-step toggle direction
    pub fn all_active(&self) -> bool {
        self.all_active
    }

    /// Power assigned to the next placed probe (millivolts)
    pub fn placement_power(&self) -> f64 {
        self.placement_power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimConfig;

    fn controller(vertex_count: usize) -> (InteractionController, SharedProbes) {
        let probes = SharedProbes::new();
        let controller = InteractionController::new(
            SimulationId::new(),
            vertex_count,
            probes.clone(),
            &SimConfig::default(),
        );
        (controller, probes)
    }

    fn place(controller: &mut InteractionController, vertex: usize) -> ProbeId {
        let hit = RaycastHit {
            sim: controller.sim,
            vertex: VertexIndex::attached(vertex),
        };
        let id = controller.instantiate_probe(hit).expect("placed");
        controller.hit_released();
        id
    }

    fn held() -> InputSample {
        InputSample {
            toggle_pressed: true,
            ..InputSample::idle()
        }
    }

    #[test]
    fn test_tap_toggles_all() {
        let (mut controller, probes) = controller(8);
        place(&mut controller, 1);
        place(&mut controller, 2);

        controller.tick(held());
        let events = controller.tick(InputSample::idle());

        assert_eq!(
            events,
            vec![InteractionEvent::ToggledAll {
                active: true,
                count: 2
            }]
        );
        let set = probes.lock();
        assert!(set.iter().all(|p| p.is_active()));
    }

    #[test]
    fn test_toggle_on_empty_set_is_silent() {
        let (mut controller, _probes) = controller(8);
        controller.tick(held());
        assert!(controller.tick(InputSample::idle()).is_empty());
        assert!(!controller.all_active());
    }

    #[test]
    fn test_release_below_threshold_toggles_at_threshold_destroys() {
        let (mut controller, probes) = controller(8);
        place(&mut controller, 0);
        let threshold = SimConfig::default().destroy_threshold;

        // One tick short of the threshold: toggle, not destroy
        for _ in 0..threshold - 1 {
            controller.tick(held());
        }
        let events = controller.tick(InputSample::idle());
        assert!(matches!(
            events.as_slice(),
            [InteractionEvent::ToggledAll { .. }]
        ));
        assert_eq!(probes.lock().len(), 1);

        // Exactly the threshold: destroy
        for _ in 0..threshold {
            controller.tick(held());
        }
        let events = controller.tick(InputSample::idle());
        assert_eq!(events, vec![InteractionEvent::DestroyedAll { count: 1 }]);
        assert!(probes.lock().is_empty());
    }

    #[test]
    fn test_power_click_suppresses_release_dispatch() {
        let (mut controller, probes) = controller(8);
        place(&mut controller, 0);
        let threshold = SimConfig::default().destroy_threshold;

        // Adjust power mid-hold, then keep holding past the threshold
        for i in 0..threshold + 10 {
            let mut sample = held();
            if i == 3 {
                sample.power_delta = 1.0;
            }
            controller.tick(sample);
        }
        let events = controller.tick(InputSample::idle());

        assert!(events.is_empty(), "release must be suppressed: {:?}", events);
        assert_eq!(probes.lock().len(), 1, "probe must survive");
        assert!(!controller.power_claimed(), "claim clears with the gesture");

        // The next gesture is live again
        controller.tick(held());
        let events = controller.tick(InputSample::idle());
        assert!(matches!(
            events.as_slice(),
            [InteractionEvent::ToggledAll { .. }]
        ));
    }

    #[test]
    fn test_power_adjustment_scales_and_applies_to_active() {
        let (mut controller, probes) = controller(8);
        place(&mut controller, 0);

        // Activate, then adjust
        controller.tick(held());
        controller.tick(InputSample::idle());

        let start = probes.lock().iter().next().expect("present").power();
        let events = controller.tick(InputSample {
            power_delta: 2.0,
            ..InputSample::idle()
        });

        let step = SimConfig::default().power_step();
        assert_eq!(
            events,
            vec![InteractionEvent::PowerAdjusted { delta: 2.0 * step }]
        );
        let now = probes.lock().iter().next().expect("present").power();
        assert_eq!(now, start + 2.0 * step);
    }

    #[test]
    fn test_highlight_follows_input_every_tick() {
        let (mut controller, probes) = controller(8);
        place(&mut controller, 0);

        controller.tick(InputSample {
            highlight_pressed: true,
            ..InputSample::idle()
        });
        assert!(probes.lock().iter().all(|p| p.is_highlighted()));

        controller.tick(InputSample::idle());
        assert!(probes.lock().iter().all(|p| !p.is_highlighted()));
    }

    #[test]
    fn test_instantiate_rejects_sentinel_foreign_and_out_of_domain() {
        let (mut controller, probes) = controller(4);
        let sim = controller.sim;

        assert!(controller
            .instantiate_probe(RaycastHit {
                sim,
                vertex: VertexIndex::UNATTACHED,
            })
            .is_none());
        controller.hit_released();

        assert!(controller
            .instantiate_probe(RaycastHit {
                sim,
                vertex: VertexIndex::attached(4),
            })
            .is_none());
        controller.hit_released();

        assert!(controller
            .instantiate_probe(RaycastHit {
                sim: SimulationId::new(),
                vertex: VertexIndex::attached(0),
            })
            .is_none());

        assert!(probes.lock().is_empty());
    }

    #[test]
    fn test_discrete_mode_places_once_per_gesture() {
        let (mut controller, probes) = controller(8);
        let hit = RaycastHit {
            sim: controller.sim,
            vertex: VertexIndex::attached(1),
        };

        assert!(controller.instantiate_probe(hit).is_some());
        assert!(controller.instantiate_probe(hit).is_none());
        assert!(controller.instantiate_probe(hit).is_none());
        controller.hit_released();
        assert!(controller.instantiate_probe(hit).is_some());

        assert_eq!(probes.lock().len(), 2);
    }

    #[test]
    fn test_continuous_mode_places_every_held_tick() {
        let probes = SharedProbes::new();
        let config = SimConfig {
            interaction_mode: InteractionMode::Continuous,
            ..SimConfig::default()
        };
        let mut controller =
            InteractionController::new(SimulationId::new(), 8, probes.clone(), &config);
        let hit = RaycastHit {
            sim: controller.sim,
            vertex: VertexIndex::attached(1),
        };

        for _ in 0..3 {
            assert!(controller.instantiate_probe(hit).is_some());
        }
        assert_eq!(probes.lock().len(), 3);
    }

    #[test]
    fn test_probe_placed_between_toggles_matches_group() {
        let (mut controller, probes) = controller(8);
        place(&mut controller, 0);

        // First toggle: group goes active
        controller.tick(held());
        controller.tick(InputSample::idle());
        assert!(controller.all_active());

        // A probe placed now starts active, matching the group
        place(&mut controller, 1);
        assert!(probes.lock().iter().all(|p| p.is_active()));

        // Second toggle: everything goes inactive together
        controller.tick(held());
        controller.tick(InputSample::idle());
        assert!(probes.lock().iter().all(|p| !p.is_active()));
    }
}
