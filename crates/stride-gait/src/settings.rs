use serde::{Deserialize, Serialize};
use stride_core::{LayerMask, Result, StrideError};

/// Per-foot stepping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepSettings {
    /// Target-to-home distance that triggers a step.
    pub max_step_distance: f32,
    /// Seconds a step takes.
    pub move_duration: f32,
    /// Arc apex height as a fraction of half the step length.
    pub highness: f32,
    /// How far past home to land, as a fraction of `max_step_distance`.
    pub overshoot_fraction: f32,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            max_step_distance: 0.35,
            move_duration: 0.2,
            highness: 0.6,
            overshoot_fraction: 0.5,
        }
    }
}

impl StepSettings {
    pub fn validate(&self) -> Result<()> {
        positive("max_step_distance", self.max_step_distance)?;
        positive("move_duration", self.move_duration)?;
        non_negative("highness", self.highness)?;
        non_negative("overshoot_fraction", self.overshoot_fraction)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaitPolicy {
    /// Both feet are polled every tick and may step together.
    Synchronous,
    /// Feet take turns; one completes its step before the other may start.
    #[default]
    Alternating,
}

/// Downward probe used to snap a home onto the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundingSettings {
    /// Probe starts this far above the projected home.
    pub probe_height: f32,
    pub probe_distance: f32,
    pub layer_mask: LayerMask,
}

impl Default for GroundingSettings {
    fn default() -> Self {
        Self {
            probe_height: 1.0,
            probe_distance: 2.5,
            layer_mask: LayerMask::TERRAIN,
        }
    }
}

impl GroundingSettings {
    pub fn validate(&self) -> Result<()> {
        non_negative("probe_height", self.probe_height)?;
        positive("probe_distance", self.probe_distance)?;
        if self.layer_mask.is_empty() {
            return Err(StrideError::InvalidConfiguration(
                "grounding layer_mask is empty".into(),
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(StrideError::InvalidConfiguration(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(StrideError::InvalidConfiguration(format!(
            "{name} must not be negative, got {value}"
        )))
    }
}
