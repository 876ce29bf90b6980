//! Simulation configuration
//!
//! All recognized options are collected here with explanations of their
//! purpose and how they interact with each other.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::interaction::InteractionMode;

/// Configuration for the simulation core
///
/// Defaults reproduce the reference interaction feel; changing them affects
/// gesture timing and clamp responsiveness.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === LIFECYCLE ===
    /// Run solver only, without visualization or interaction
    pub dry_run: bool,

    /// Launch the solver thread at the end of initialization
    pub start_on_awake: bool,

    // === INTERACTION ===
    /// Hold duration, in foreground ticks, at which releasing the toggle
    /// gesture destroys every probe instead of toggling them
    ///
    /// Below the threshold a release toggles; at or above it destroys.
    /// This is a tick count, not wall-clock time: a front end running at a
    /// variable frame rate should convert an equivalent duration to ticks.
    pub destroy_threshold: u32,

    /// Sensitivity of the power adjustment control
    ///
    /// Lower sensitivity means clamp power changes more quickly: one unit
    /// of input delta moves power by `(power_max - power_min) / sensitivity`
    /// millivolts per tick.
    pub power_sensitivity: f64,

    /// Interaction mode selected once at setup
    pub interaction_mode: InteractionMode,

    // === CLAMP RANGE ===
    /// Lower end of the clamp power range (millivolts)
    pub power_min: f64,

    /// Upper end of the clamp power range (millivolts)
    ///
    /// New probes are placed at the midpoint of the range.
    pub power_max: f64,

    // === SOLVER ===
    /// Optional pause between solver iterations, in microseconds
    ///
    /// `None` lets the solver free-run at full speed. Front ends that only
    /// render at frame rate can set a small interval to spare a core.
    pub step_interval_us: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            start_on_awake: true,

            // A ~1 second hold at 50 ticks/sec before destroy fires
            destroy_threshold: 50,
            power_sensitivity: 100.0,
            interaction_mode: InteractionMode::Discrete,

            // Physiological membrane potential range
            power_min: -90.0,
            power_max: 60.0,

            step_interval_us: None,
        }
    }
}

impl SimConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.power_min >= self.power_max {
            return Err(format!(
                "power_min ({}) must be < power_max ({})",
                self.power_min, self.power_max
            ));
        }

        if self.power_sensitivity <= 0.0 {
            return Err(format!(
                "power_sensitivity ({}) must be positive",
                self.power_sensitivity
            ));
        }

        // Threshold 0 would make every release a destroy
        if self.destroy_threshold == 0 {
            return Err("destroy_threshold must be at least 1".into());
        }

        Ok(())
    }

    /// Per-tick power step for one unit of input delta (millivolts)
    pub fn power_step(&self) -> f64 {
        (self.power_max - self.power_min) / self.power_sensitivity
    }

    /// Power assigned to newly placed probes (range midpoint, millivolts)
    pub fn placement_power(&self) -> f64 {
        (self.power_min + self.power_max) / 2.0
    }

    /// Solver pacing as a `Duration`, if configured
    pub fn step_interval(&self) -> Option<Duration> {
        self.step_interval_us.map(Duration::from_micros)
    }

    /// Load a config from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_power_range_rejected() {
        let config = SimConfig {
            power_min: 60.0,
            power_max: -90.0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = SimConfig {
            destroy_threshold: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_sensitivity_rejected() {
        let config = SimConfig {
            power_sensitivity: 0.0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_power_values() {
        let config = SimConfig {
            power_min: -100.0,
            power_max: 100.0,
            power_sensitivity: 100.0,
            ..SimConfig::default()
        };
        assert_eq!(config.power_step(), 2.0);
        assert_eq!(config.placement_power(), 0.0);
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml_str = r#"
            dry_run = true
            destroy_threshold = 30
            interaction_mode = "continuous"
            step_interval_us = 500
        "#;
        let config: SimConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.dry_run);
        assert_eq!(config.destroy_threshold, 30);
        assert_eq!(config.interaction_mode, InteractionMode::Continuous);
        assert_eq!(config.step_interval(), Some(Duration::from_micros(500)));
        // Unspecified fields keep their defaults
        assert!(config.start_on_awake);
    }
}
