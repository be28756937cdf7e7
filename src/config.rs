use serde::Deserialize;

use crate::error::{NdrError, Result};
use crate::ndr::{advisor::DEFAULT_CUTOFF_HOUR, EligibilityChecker, NslPolicy, TimeWindowAdvisor};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub policy: NslPolicy,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_token: String,
    /// Deadline for the single gateway call
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_token: String::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub cutoff_hour: u32,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self { cutoff_hour: DEFAULT_CUTOFF_HOUR }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "ndr_actions.db".to_string() }
    }
}

impl Config {
    /// Load `path` (extension optional, file may be absent) layered with `NDR__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("NDR").separator("__"))
            .build()
            .map_err(|e| NdrError::Config(e.to_string()))?;

        let config: Config = config
            .try_deserialize()
            .map_err(|e| NdrError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(NdrError::Config("gateway.base_url must be set".to_string()));
        }
        if self.advisory.cutoff_hour > 23 {
            return Err(NdrError::Config(format!(
                "advisory.cutoff_hour must be 0-23, got {}",
                self.advisory.cutoff_hour
            )));
        }
        Ok(())
    }

    pub fn eligibility_checker(&self) -> EligibilityChecker {
        EligibilityChecker::new(self.policy.clone())
    }

    pub fn advisor(&self) -> Result<TimeWindowAdvisor> {
        TimeWindowAdvisor::new(self.advisory.cutoff_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndr::NdrAction;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.policy, NslPolicy::default());
        assert_eq!(config.advisory.cutoff_hour, 21);
        assert_eq!(config.gateway.timeout_secs, 30);
    }

    #[test]
    fn test_policy_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[gateway]
base_url = "https://courier.test/api"

[policy]
re_attempt_codes = ["EOD-74"]
rto_codes = ["EOD-21", "EOD-900"]

[advisory]
cutoff_hour = 20
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        let policy = &config.policy;
        assert!(policy.permits("EOD-900", NdrAction::PickupReschedule));
        assert!(!policy.permits("EOD-15", NdrAction::ReAttempt));
        assert_eq!(policy.max_prior_attempts, 2);
        assert_eq!(config.advisor().unwrap().cutoff_hour(), 20);
    }

    #[test]
    fn test_validate_rejects_bad_cutoff() {
        let mut config = Config::default();
        config.advisory.cutoff_hour = 24;
        assert!(matches!(config.validate(), Err(NdrError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = Config::default();
        config.gateway.base_url = "  ".to_string();
        assert!(matches!(config.validate(), Err(NdrError::Config(_))));
    }
}
