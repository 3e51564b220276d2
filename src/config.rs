//! Population balance configuration
//!
//! The configuration tree mirrors the dictionary a case would provide: the
//! group discretization, one model selection per pluggable family (each with
//! its own scalar parameters) and a few numerical switches. It is plain data;
//! turning it into a running model is the job of
//! [`PopulationBalanceModel::from_config`](crate::models::PopulationBalanceModel::from_config).
//!
//! ```rust
//! use popbal_rs::config::PopulationBalanceConfig;
//!
//! let config = PopulationBalanceConfig::from_json_str(r#"{
//!     "groups": { "rule": "explicit", "volumes": [1.0, 2.0, 4.0] },
//!     "breakupRateModel": { "model": "exponential", "C": 1.0, "exponent": 0.0 },
//!     "daughterDistributionModel": { "model": "uniformBinary" }
//! }"#).unwrap();
//!
//! assert_eq!(config.shape_model.model, "spherical");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::Path;

use crate::error::{PbeError, PbeResult};

/// Complete population balance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PopulationBalanceConfig {
    /// Name used in logs and checkpoints
    #[serde(default = "default_name")]
    pub name: String,

    /// Group discretization
    pub groups: GroupsConfig,

    /// Breakup rate law
    pub breakup_rate_model: ModelSelection,

    /// Daughter (fragment) redistribution law
    pub daughter_distribution_model: ModelSelection,

    /// Particle shape closure
    #[serde(default = "default_shape")]
    pub shape_model: ModelSelection,

    /// Coalescence kernel, absent when the population only breaks up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coalescence_rate_model: Option<ModelSelection>,

    /// Uniform initial number density, one value per group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_number_density: Option<Vec<f64>>,

    /// How the built-in stepper treats the death term
    #[serde(default)]
    pub source_treatment: SourceTreatment,
}

fn default_name() -> String {
    "populationBalance".to_string()
}

fn default_shape() -> ModelSelection {
    ModelSelection::new("spherical")
}

impl PopulationBalanceConfig {
    /// Parse from a JSON string
    pub fn from_json_str(contents: &str) -> PbeResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PbeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to a single-line JSON string
    pub fn to_json(&self) -> PbeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Structural checks that do not need the model registry
    ///
    /// Group volumes themselves are validated by
    /// [`GroupSet::new`](crate::models::GroupSet::new).
    pub fn validate(&self) -> PbeResult<()> {
        self.groups.validate()?;

        if let Some(initial) = &self.initial_number_density {
            let expected = self.groups.count();
            if initial.len() != expected {
                return Err(PbeError::SizeMismatch {
                    what: "initialNumberDensity".to_string(),
                    expected,
                    found: initial.len(),
                });
            }
            if let Some((index, value)) = initial
                .iter()
                .enumerate()
                .find(|(_, n)| !n.is_finite() || **n < 0.0)
            {
                return Err(PbeError::InvalidConfiguration(format!(
                    "initialNumberDensity[{}] = {} must be finite and non-negative",
                    index, value
                )));
            }
        }

        Ok(())
    }
}

// =================================================================================================
// Group discretization
// =================================================================================================

/// Rule generating the representative group volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum GroupsConfig {
    /// Volumes listed one by one; `count`, when given, must match
    #[serde(rename_all = "camelCase")]
    Explicit {
        volumes: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<usize>,
    },

    /// Diameters spaced geometrically between `min_diameter` and `max_diameter`
    #[serde(rename_all = "camelCase")]
    GeometricDiameter {
        count: usize,
        min_diameter: f64,
        max_diameter: f64,
    },

    /// Volumes `min_volume * ratio^i`
    #[serde(rename_all = "camelCase")]
    GeometricVolume {
        count: usize,
        min_volume: f64,
        ratio: f64,
    },
}

impl GroupsConfig {
    /// Number of groups this rule produces
    pub fn count(&self) -> usize {
        match self {
            GroupsConfig::Explicit { volumes, .. } => volumes.len(),
            GroupsConfig::GeometricDiameter { count, .. } => *count,
            GroupsConfig::GeometricVolume { count, .. } => *count,
        }
    }

    fn validate(&self) -> PbeResult<()> {
        match self {
            GroupsConfig::Explicit { volumes, count } => {
                if volumes.is_empty() {
                    return Err(PbeError::EmptyGroupSet);
                }
                if let Some(count) = count
                    && *count != volumes.len()
                {
                    return Err(PbeError::SizeMismatch {
                        what: "group volumes".to_string(),
                        expected: *count,
                        found: volumes.len(),
                    });
                }
                Ok(())
            }
            GroupsConfig::GeometricDiameter {
                count,
                min_diameter,
                max_diameter,
            } => {
                if *count == 0 {
                    return Err(PbeError::EmptyGroupSet);
                }
                if !(*min_diameter > 0.0 && min_diameter.is_finite()) {
                    return Err(PbeError::InvalidConfiguration(format!(
                        "minDiameter must be positive, got {}",
                        min_diameter
                    )));
                }
                if *count > 1 && !(max_diameter > min_diameter && max_diameter.is_finite()) {
                    return Err(PbeError::InvalidConfiguration(format!(
                        "maxDiameter ({}) must exceed minDiameter ({})",
                        max_diameter, min_diameter
                    )));
                }
                Ok(())
            }
            GroupsConfig::GeometricVolume {
                count,
                min_volume,
                ratio,
            } => {
                if *count == 0 {
                    return Err(PbeError::EmptyGroupSet);
                }
                if !(*min_volume > 0.0 && min_volume.is_finite()) {
                    return Err(PbeError::InvalidConfiguration(format!(
                        "minVolume must be positive, got {}",
                        min_volume
                    )));
                }
                if *count > 1 && !(*ratio > 1.0 && ratio.is_finite()) {
                    return Err(PbeError::InvalidConfiguration(format!(
                        "ratio must exceed 1, got {}",
                        ratio
                    )));
                }
                Ok(())
            }
        }
    }

    /// Representative volumes generated by this rule
    ///
    /// Monotonicity and positivity are checked by the group set, not here,
    /// so that explicit lists report the offending index.
    pub fn volumes(&self) -> PbeResult<Vec<f64>> {
        self.validate()?;

        let volumes = match self {
            GroupsConfig::Explicit { volumes, .. } => volumes.clone(),
            GroupsConfig::GeometricDiameter {
                count,
                min_diameter,
                max_diameter,
            } => {
                let spread = if *count > 1 {
                    (max_diameter / min_diameter).ln() / (*count as f64 - 1.0)
                } else {
                    0.0
                };
                (0..*count)
                    .map(|i| {
                        let d = min_diameter * (spread * i as f64).exp();
                        PI / 6.0 * d.powi(3)
                    })
                    .collect()
            }
            GroupsConfig::GeometricVolume {
                count,
                min_volume,
                ratio,
            } => (0..*count)
                .map(|i| min_volume * ratio.powi(i as i32))
                .collect(),
        };

        Ok(volumes)
    }
}

// =================================================================================================
// Model selection
// =================================================================================================

/// One pluggable model: its registry key plus its scalar parameters
///
/// In JSON the parameters sit next to the key:
/// `{ "model": "exponential", "C": 2.0, "exponent": 0.5 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Registry key
    pub model: String,

    /// Variant parameters
    #[serde(flatten)]
    pub parameters: BTreeMap<String, f64>,
}

impl ModelSelection {
    /// Selection without parameters
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            parameters: BTreeMap::new(),
        }
    }

    /// Builder pattern: add a parameter
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    /// Required finite parameter
    pub fn require(&self, key: &str) -> PbeResult<f64> {
        let value = *self
            .parameters
            .get(key)
            .ok_or_else(|| PbeError::MissingParameter {
                model: self.model.clone(),
                parameter: key.to_string(),
            })?;

        if !value.is_finite() {
            return Err(self.invalid(key, value, "must be finite"));
        }
        Ok(value)
    }

    /// Required parameter that must be strictly positive
    pub fn require_positive(&self, key: &str) -> PbeResult<f64> {
        let value = self.require(key)?;
        if value <= 0.0 {
            return Err(self.invalid(key, value, "must be positive"));
        }
        Ok(value)
    }

    /// Required parameter that must not be negative
    pub fn require_non_negative(&self, key: &str) -> PbeResult<f64> {
        let value = self.require(key)?;
        if value < 0.0 {
            return Err(self.invalid(key, value, "must not be negative"));
        }
        Ok(value)
    }

    /// Optional parameter with a default
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.parameters.get(key).copied().unwrap_or(default)
    }

    /// Reject any parameter outside `known`
    ///
    /// Keys are case-sensitive, so a mistyped optional parameter is an error
    /// rather than a silent fallback to its default.
    pub fn allow_only(&self, known: &[&str]) -> PbeResult<()> {
        match self
            .parameters
            .iter()
            .find(|(key, _)| !known.contains(&key.as_str()))
        {
            Some((key, value)) => {
                let reason = if known.is_empty() {
                    "model takes no parameters".to_string()
                } else {
                    format!("unknown parameter, expected one of: {}", known.join(", "))
                };
                Err(self.invalid(key, *value, &reason))
            }
            None => Ok(()),
        }
    }

    /// Error for an out-of-range parameter
    pub fn invalid(&self, key: &str, value: f64, reason: &str) -> PbeError {
        PbeError::InvalidParameter {
            model: self.model.clone(),
            parameter: key.to_string(),
            value,
            reason: reason.to_string(),
        }
    }
}

// =================================================================================================
// Numerical switches
// =================================================================================================

/// Time treatment of the death term in the built-in stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceTreatment {
    /// `n + dt * (birth - death)`; conserves volume exactly
    #[default]
    Explicit,

    /// `(n + dt * birth) / (1 + dt * rate)`; unconditionally non-negative
    LinearizedImplicit,
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str = r#"{
        "groups": { "rule": "explicit", "volumes": [1.0, 2.0, 4.0] },
        "breakupRateModel": { "model": "exponential", "C": 2.0, "exponent": 0.5 },
        "daughterDistributionModel": { "model": "uniformBinary" }
    }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = PopulationBalanceConfig::from_json_str(MINIMAL).unwrap();

        assert_eq!(config.name, "populationBalance");
        assert_eq!(config.shape_model, ModelSelection::new("spherical"));
        assert!(config.coalescence_rate_model.is_none());
        assert_eq!(config.source_treatment, SourceTreatment::Explicit);
        assert_eq!(config.breakup_rate_model.require("C").unwrap(), 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PopulationBalanceConfig::from_json_str(MINIMAL).unwrap();
        let json = config.to_json().unwrap();
        let again = PopulationBalanceConfig::from_json_str(&json).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_missing_parameter() {
        let selection = ModelSelection::new("exponential").with("C", 1.0);
        let err = selection.require("exponent").unwrap_err();
        assert!(matches!(err, PbeError::MissingParameter { .. }));
        assert!(err.to_string().contains("exponent"));
    }

    #[test]
    fn test_allow_only_names_stray_key() {
        let selection = ModelSelection::new("exponential")
            .with("C", 1.0)
            .with("exponent", 0.0);
        assert!(selection.allow_only(&["C", "exponent"]).is_ok());

        let typo = selection.clone().with("expnent", 3.0);
        match typo.allow_only(&["C", "exponent"]).unwrap_err() {
            PbeError::InvalidParameter {
                model,
                parameter,
                value,
                ..
            } => {
                assert_eq!(model, "exponential");
                assert_eq!(parameter, "expnent");
                assert_eq!(value, 3.0);
            }
            other => panic!("unexpected error {other}"),
        }

        let err = ModelSelection::new("spherical")
            .with("factor", 1.0)
            .allow_only(&[])
            .unwrap_err();
        assert!(err.to_string().contains("takes no parameters"));
    }

    #[test]
    fn test_non_positive_parameter() {
        let selection = ModelSelection::new("nonSpherical").with("factor", 0.0);
        assert!(matches!(
            selection.require_positive("factor"),
            Err(PbeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_explicit_count_mismatch() {
        let groups = GroupsConfig::Explicit {
            volumes: vec![1.0, 2.0],
            count: Some(3),
        };
        assert!(matches!(
            groups.volumes(),
            Err(PbeError::SizeMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_initial_density_mismatch() {
        let mut config = PopulationBalanceConfig::from_json_str(MINIMAL).unwrap();
        config.initial_number_density = Some(vec![0.0, 10.0]);
        assert!(matches!(
            config.validate(),
            Err(PbeError::SizeMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_geometric_diameter_spacing() {
        let groups = GroupsConfig::GeometricDiameter {
            count: 3,
            min_diameter: 1.0,
            max_diameter: 4.0,
        };
        let volumes = groups.volumes().unwrap();

        assert_eq!(volumes.len(), 3);
        assert_relative_eq!(volumes[0], PI / 6.0, max_relative = 1e-12);
        assert_relative_eq!(volumes[1], PI / 6.0 * 8.0, max_relative = 1e-12);
        assert_relative_eq!(volumes[2], PI / 6.0 * 64.0, max_relative = 1e-12);
    }

    #[test]
    fn test_geometric_volume_spacing() {
        let groups = GroupsConfig::GeometricVolume {
            count: 4,
            min_volume: 0.5,
            ratio: 2.0,
        };
        assert_eq!(groups.volumes().unwrap(), vec![0.5, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = MINIMAL.replace("\"groups\"", "\"grups\"");
        assert!(PopulationBalanceConfig::from_json_str(&json).is_err());
    }
}
