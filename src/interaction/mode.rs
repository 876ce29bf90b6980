//! Discrete/continuous interaction modes
//!
//! The mode is selected once at setup and decides how hit events are
//! admitted for probe placement. Dispatch goes through a small table of
//! strategies rather than per-call branching.

use serde::Deserialize;

/// How placement hits are admitted during a hold gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// One probe per press edge: repeated hits within the same gesture are
    /// ignored until the gesture releases
    #[default]
    Discrete,
    /// One probe per held tick
    Continuous,
}

impl InteractionMode {
    pub(crate) fn strategy(self) -> &'static dyn HitStrategy {
        STRATEGIES[self as usize]
    }
}

/// Admission rule for one hit event within a gesture
pub(crate) trait HitStrategy: Sync {
    /// `gesture_held` is true when earlier hits of the same gesture have
    /// already been seen
    fn admits(&self, gesture_held: bool) -> bool;
}

struct Discrete;

impl HitStrategy for Discrete {
    fn admits(&self, gesture_held: bool) -> bool {
        !gesture_held
    }
}

struct Continuous;

impl HitStrategy for Continuous {
    fn admits(&self, _gesture_held: bool) -> bool {
        true
    }
}

static STRATEGIES: [&(dyn HitStrategy); 2] = [&Discrete, &Continuous];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_admits_press_edge_only() {
        let strategy = InteractionMode::Discrete.strategy();
        assert!(strategy.admits(false));
        assert!(!strategy.admits(true));
    }

    #[test]
    fn test_continuous_admits_every_tick() {
        let strategy = InteractionMode::Continuous.strategy();
        assert!(strategy.admits(false));
        assert!(strategy.admits(true));
    }
}
