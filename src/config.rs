//! Validation limits and workflow switches
use super::error::ValidationError;
use serde::Deserialize;
use std::path::Path;

/// Hours in a week
pub const MAX_WEEKLY_HOURS: f64 = 168.0;
/// Ceiling on any configured hourly rate, in dollars
pub const MAX_RATE_CAP: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub min_hours: f64,
    pub max_hours: f64,
    pub min_hourly_rate: f64,
    pub max_hourly_rate: f64,
    /// Adds a REJECTED --SUBMIT_FOR_APPROVAL--> PENDING_TUTOR_CONFIRMATION edge
    pub allow_resubmission_after_rejection: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            min_hours: 0.1,
            max_hours: 38.0,
            min_hourly_rate: 10.0,
            max_hourly_rate: 200.0,
            allow_resubmission_after_rejection: false,
        }
    }
}

impl WorkflowConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = [
            self.min_hours,
            self.max_hours,
            self.min_hourly_rate,
            self.max_hourly_rate,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0);

        if !finite {
            return Err(ValidationError::InvalidConfig(
                "limits must be finite and non-negative".into(),
            ));
        }
        if self.max_hours > MAX_WEEKLY_HOURS {
            return Err(ValidationError::InvalidConfig(format!(
                "max_hours exceeds {MAX_WEEKLY_HOURS}"
            )));
        }
        if self.max_hourly_rate > MAX_RATE_CAP {
            return Err(ValidationError::InvalidConfig(format!(
                "max_hourly_rate exceeds {MAX_RATE_CAP}"
            )));
        }
        if self.min_hours > self.max_hours {
            return Err(ValidationError::InvalidConfig(
                "min_hours exceeds max_hours".into(),
            ));
        }
        if self.min_hourly_rate > self.max_hourly_rate {
            return Err(ValidationError::InvalidConfig(
                "min_hourly_rate exceeds max_hourly_rate".into(),
            ));
        }
        Ok(())
    }

    // hours are stored in hundredths, rates in cents
    pub fn hours_range(&self) -> (u32, u32) {
        (
            (self.min_hours * 100.0).round() as u32,
            (self.max_hours * 100.0).round() as u32,
        )
    }

    pub fn rate_range(&self) -> (u64, u64) {
        (
            (self.min_hourly_rate * 100.0).round() as u64,
            (self.max_hourly_rate * 100.0).round() as u64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = WorkflowConfig::from_toml_str("max_hours = 20.5").unwrap();

        assert_eq!(config.hours_range(), (10, 2050));
        assert_eq!(config.rate_range(), (1000, 20000));
        assert!(!config.allow_resubmission_after_rejection);
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let res = WorkflowConfig::from_toml_str("min_hourly_rate = 300.0");
        assert!(res.is_err());
    }

    #[test]
    fn oversized_limits_are_rejected() {
        for raw in ["max_hours = 1000.0", "max_hourly_rate = 1.0e15"] {
            let err = WorkflowConfig::from_toml_str(raw).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ValidationError>(),
                Some(ValidationError::InvalidConfig(_))
            ));
        }
        let config = WorkflowConfig::from_toml_str("max_hours = 168.0").unwrap();
        assert_eq!(config.hours_range().1, 16_800);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.toml");
        std::fs::write(&path, "allow_resubmission_after_rejection = true\n").unwrap();

        let config = WorkflowConfig::from_file(&path).unwrap();
        assert!(config.allow_resubmission_after_rejection);
    }
}
