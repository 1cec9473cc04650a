use crate::{GaitPolicy, GroundingSettings, StepSettings};
use serde::{Deserialize, Serialize};
use stride_core::Result;
use stride_ik::IkSettings;

/// Everything a `LegRig` is configured with. Fixed once the rig is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigConfig {
    pub ik: IkSettings,
    pub step: StepSettings,
    pub gait: GaitPolicy,
    /// `null` disables re-grounding of the homes.
    pub grounding: Option<GroundingSettings>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            ik: IkSettings::default(),
            step: StepSettings::default(),
            gait: GaitPolicy::default(),
            grounding: Some(GroundingSettings::default()),
        }
    }
}

impl RigConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.ik.validate()?;
        self.step.validate()?;
        if let Some(grounding) = &self.grounding {
            grounding.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stride_core::{LayerMask, StrideError};

    #[test]
    fn empty_object_is_default() {
        let config = RigConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RigConfig::default());
    }

    #[test]
    fn parses_partial_overrides() {
        let config = RigConfig::from_json_str(
            r#"{
                "ik": { "iterations": 16 },
                "step": { "max_step_distance": 0.5 },
                "gait": "synchronous",
                "grounding": { "layer_mask": "TERRAIN | PROPS" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.ik.iterations, 16);
        assert_eq!(config.ik.tolerance, IkSettings::default().tolerance);
        assert_eq!(config.step.max_step_distance, 0.5);
        assert_eq!(config.gait, GaitPolicy::Synchronous);
        assert_eq!(
            config.grounding.map(|g| g.layer_mask),
            Some(LayerMask::TERRAIN | LayerMask::PROPS)
        );
    }

    #[test]
    fn null_grounding_disables_probe() {
        let config = RigConfig::from_json_str(r#"{ "grounding": null }"#).unwrap();
        assert_eq!(config.grounding, None);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = RigConfig::from_json_str(r#"{ "step": { "stride": 1.0 } }"#).unwrap_err();
        assert!(matches!(err, StrideError::Config(_)));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = RigConfig::from_json_str(r#"{ "step": { "move_duration": -1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, StrideError::InvalidConfiguration(_)));
    }

    #[test]
    fn survives_serialization() {
        let config = RigConfig {
            gait: GaitPolicy::Synchronous,
            ..RigConfig::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(RigConfig::from_json_str(&json).unwrap(), config);
    }
}
