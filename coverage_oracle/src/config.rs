// Configuration for the coverage oracle
//
// Every field has a default so the oracle runs with no configuration file at all.
// Values are layered: defaults, then an optional TOML/JSON file, then
// COVERAGE_ORACLE_* environment variables.

use clap::ValueEnum;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{OracleError, Result};

/// Prefix for environment overrides, e.g. `COVERAGE_ORACLE_MOVEMENT__MAX_SPEED_KMH=500`
pub const ENV_PREFIX: &str = "COVERAGE_ORACLE";

/// Top-level oracle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OracleConfig {
    /// IP reputation providers and keyword tables
    pub reputation: ReputationConfig,

    /// Movement consistency limits
    pub movement: MovementConfig,

    /// Verdict threshold policy
    pub scoring: ScoringConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// What to do when no reputation provider gives a usable answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InconclusivePolicy {
    /// Award the points; provider outages must not block genuine contributors
    #[default]
    FailOpen,
    /// Withhold the points
    FailClosed,
}

/// How the pass threshold treats a missing MOVEMENT check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Always 70 out of 100, so history-less reports top out at 90
    #[default]
    Fixed,
    /// 70% of the points achievable by the checks that actually ran
    Renormalized,
}

/// A single IP-intelligence endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Short name used in logs
    pub name: String,

    /// URL with an `{ip}` placeholder
    pub url_template: String,
}

/// IP reputation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Timeout for a single provider request in milliseconds
    pub provider_timeout_ms: u64,

    /// Bound on the whole reputation step in milliseconds
    pub deadline_ms: u64,

    /// Organization name fragments of known VPN services
    pub vpn_providers: Vec<String>,

    /// Organization name fragments of hosting / datacenter networks
    pub datacenter_keywords: Vec<String>,

    /// Outcome when every provider is unreachable
    pub on_inconclusive: InconclusivePolicy,

    /// Fail loopback, private, link-local and other special-purpose addresses
    /// without asking any provider
    pub reject_non_public: bool,

    /// Providers in the order they are queried
    pub providers: Vec<ProviderConfig>,
}

/// Movement consistency configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Highest plausible average travel speed in km/h
    pub max_speed_kmh: f64,
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub threshold_mode: ThresholdMode,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    pub level: String,
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "ipapi".to_string(),
            url_template: "https://ipapi.co/{ip}/json/".to_string(),
        },
        ProviderConfig {
            name: "ipinfo".to_string(),
            url_template: "https://ipinfo.io/{ip}/json".to_string(),
        },
    ]
}

fn default_vpn_providers() -> Vec<String> {
    [
        "nordvpn",
        "expressvpn",
        "surfshark",
        "cyberghost",
        "protonvpn",
        "mullvad",
        "windscribe",
        "tunnelbear",
        "hotspotshield",
        "purevpn",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_datacenter_keywords() -> Vec<String> {
    [
        "datacenter",
        "hosting",
        "cloud",
        "server",
        "vps",
        "digital ocean",
        "aws",
        "google",
        "azure",
        "linode",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 5_000,
            deadline_ms: 10_000,
            vpn_providers: default_vpn_providers(),
            datacenter_keywords: default_datacenter_keywords(),
            on_inconclusive: InconclusivePolicy::default(),
            reject_non_public: false,
            providers: default_providers(),
        }
    }
}

impl ReputationConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        // commercial aircraft cruising speed
        Self { max_speed_kmh: 900.0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl OracleConfig {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(OracleError::Configuration(format!(
                    "Config file not found at {:?}",
                    path
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, e.g. to seed a config file
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate config values
    pub fn validate(&self) -> Result<()> {
        let reputation = &self.reputation;

        if reputation.providers.is_empty() {
            return Err(OracleError::Configuration(
                "At least one reputation provider is required".to_string(),
            ));
        }

        for provider in &reputation.providers {
            if !provider.url_template.contains("{ip}") {
                return Err(OracleError::Configuration(format!(
                    "Provider {} URL template has no {{ip}} placeholder",
                    provider.name
                )));
            }
        }

        if reputation.provider_timeout_ms == 0 || reputation.deadline_ms == 0 {
            return Err(OracleError::Configuration(
                "Reputation timeouts cannot be zero".to_string(),
            ));
        }

        let max_speed = self.movement.max_speed_kmh;
        if !max_speed.is_finite() || max_speed <= 0.0 {
            return Err(OracleError::Configuration(format!(
                "Movement speed ceiling must be a positive number, got {}",
                max_speed
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(content: &str) -> Result<OracleConfig> {
        let config: OracleConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = OracleConfig::default();

        assert_eq!(config.reputation.providers.len(), 2);
        assert_eq!(config.reputation.provider_timeout(), Duration::from_secs(5));
        assert_eq!(config.reputation.on_inconclusive, InconclusivePolicy::FailOpen);
        assert!(!config.reputation.reject_non_public);
        assert_eq!(config.movement.max_speed_kmh, 900.0);
        assert_eq!(config.scoring.threshold_mode, ThresholdMode::Fixed);
        assert!(config.reputation.vpn_providers.contains(&"mullvad".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = from_toml(
            r#"
            [movement]
            max_speed_kmh = 500.0

            [reputation]
            on_inconclusive = "fail_closed"
            reject_non_public = true

            [scoring]
            threshold_mode = "renormalized"
            "#,
        )
        .unwrap();

        assert_eq!(config.movement.max_speed_kmh, 500.0);
        assert_eq!(config.reputation.on_inconclusive, InconclusivePolicy::FailClosed);
        assert!(config.reputation.reject_non_public);
        assert_eq!(config.scoring.threshold_mode, ThresholdMode::Renormalized);
        assert_eq!(config.reputation.providers.len(), 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_survives_toml_rendering() {
        let rendered = OracleConfig::default().to_toml().unwrap();
        assert_eq!(from_toml(&rendered).unwrap(), OracleConfig::default());
    }

    #[test]
    fn test_rejects_empty_provider_list() {
        let mut config = OracleConfig::default();
        config.reputation.providers.clear();
        assert!(matches!(config.validate(), Err(OracleError::Configuration(_))));
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let mut config = OracleConfig::default();
        config.reputation.providers[0].url_template = "https://ipapi.co/json/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let mut config = OracleConfig::default();
        config.movement.max_speed_kmh = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = OracleConfig::load(Some(Path::new("/nonexistent/oracle.toml"))).unwrap_err();
        assert!(matches!(err, OracleError::Configuration(_)));
    }
}
