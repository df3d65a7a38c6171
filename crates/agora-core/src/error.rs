//! Error types for Agora.
//!
//! Simulation operations themselves never fail: missing agents, edges and
//! domains degrade to no-ops or defaults. Errors cover the edges where
//! untrusted input enters: names, scenario files and their values.

use thiserror::Error;

/// Result type for Agora operations.
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Errors that can occur while parsing or loading simulation input.
#[derive(Error, Debug, Clone)]
pub enum AgoraError {
    #[error("Unknown {kind}: {name}")]
    UnknownVariant { kind: &'static str, name: String },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AgoraError {
    fn from(e: std::io::Error) -> Self {
        AgoraError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AgoraError {
    fn from(e: serde_json::Error) -> Self {
        AgoraError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for AgoraError {
    fn from(e: toml::de::Error) -> Self {
        AgoraError::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for AgoraError {
    fn from(e: toml::ser::Error) -> Self {
        AgoraError::Serialization(e.to_string())
    }
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl AgoraError {
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AgoraError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        })
    }

    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, value: f64) -> Self {
        AgoraError::Config(ConfigError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        })
    }
}

/// Check that `value` lies in `[min, max]`.
pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() || value < min || value > max {
        return Err(AgoraError::out_of_range(field, min, max, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_field() {
        let err = check_range("strength", 1.5, 0.0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Config error: strength out of range: 1.5 (must be 0-1)");
    }

    #[test]
    fn nan_is_out_of_range() {
        assert!(check_range("edge_probability", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn in_range_passes() {
        assert!(check_range("complexity", 0.0, 0.0, 1.0).is_ok());
        assert!(check_range("complexity", 1.0, 0.0, 1.0).is_ok());
    }
}
