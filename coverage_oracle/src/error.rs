use thiserror::Error;

/// Core error types for the coverage oracle
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OracleError {
    /// Whether the error came from malformed caller input
    pub fn is_input_error(&self) -> bool {
        matches!(self, OracleError::InvalidInput(_))
    }
}

impl From<serde_json::Error> for OracleError {
    fn from(err: serde_json::Error) -> Self {
        OracleError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout(err.to_string())
        } else {
            OracleError::Provider(err.to_string())
        }
    }
}

impl From<config::ConfigError> for OracleError {
    fn from(err: config::ConfigError) -> Self {
        OracleError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for OracleError {
    fn from(err: toml::ser::Error) -> Self {
        OracleError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, OracleError>;
