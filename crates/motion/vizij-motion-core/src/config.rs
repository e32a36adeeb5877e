//! Core configuration for vizij-motion-core.

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Defaults, sampling steps and hard caps shared by generators, controllers,
/// the acceleration bridge and the sequencer. All times are milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Tween duration used when an animation does not name one.
    pub default_duration: f64,
    /// Segment duration used by the sequencer when nothing overrides it.
    pub sequence_default_duration: f64,

    /// Step used when searching for the duration of a generator without a closed form.
    pub duration_search_step: f64,
    /// Simulated-time cap for duration search and keyframe pregeneration.
    pub max_generator_duration: f64,
    /// Step used when pregenerating compositor keyframes.
    pub pregenerate_step: f64,
    /// Distance between the two samples used to estimate handoff velocity.
    pub handoff_sample_delta: f64,
    /// Backward-difference window for spring velocity estimates.
    pub velocity_sample_delta: f64,

    /// Spring parameters used when the duration resolver fails to converge.
    pub spring: SpringDefaults,

    /// Highest repeat count accepted inside a sequence segment (exclusive).
    pub max_sequence_repeat: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringDefaults {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for SpringDefaults {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration: 300.0,
            sequence_default_duration: 300.0,
            duration_search_step: 50.0,
            max_generator_duration: 20_000.0,
            pregenerate_step: 10.0,
            handoff_sample_delta: 10.0,
            velocity_sample_delta: 5.0,
            spring: SpringDefaults::default(),
            max_sequence_repeat: 20,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, MotionError> {
        let cfg: Config = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject steps and caps that would make sampling loops degenerate.
    pub fn validate(&self) -> Result<(), MotionError> {
        let positive = [
            ("defaultDuration", self.default_duration),
            ("sequenceDefaultDuration", self.sequence_default_duration),
            ("durationSearchStep", self.duration_search_step),
            ("maxGeneratorDuration", self.max_generator_duration),
            ("pregenerateStep", self.pregenerate_step),
            ("handoffSampleDelta", self.handoff_sample_delta),
            ("velocitySampleDelta", self.velocity_sample_delta),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MotionError::invalid_option(
                    field,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        Ok(())
    }
}
