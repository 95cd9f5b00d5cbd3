//! Error types for kgviz

use thiserror::Error;

/// Result type alias using kgviz's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Kgviz error types with helpful messages and suggestions
///
/// Only failures that abort a whole operation live here. Problems with a
/// single imported record are tallied in the import report instead.
#[derive(Error, Debug)]
pub enum Error {
    // Payload errors (E100-E199)
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Lookup errors (E200-E299)
    #[error("Entity '{0}' not found. Run `kgviz export` to see the stored graph.")]
    EntityNotFound(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "E100",
            Self::InvalidInput(_) => "E101",
            Self::EntityNotFound(_) => "E200",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidPayload(_) => Some("kgviz validate <file>".to_string()),
            Self::EntityNotFound(_) => Some("kgviz export".to_string()),
            Self::ConfigError(_) => Some("kgviz config list".to_string()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidPayload(format!("Invalid JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_payload_error() {
        let error = Error::InvalidPayload("'nodes' must be an array".to_string());
        assert_eq!(error.code(), "E100");
        assert_eq!(error.suggestion(), Some("kgviz validate <file>".to_string()));
        assert!(error.to_string().contains("'nodes' must be an array"));
    }

    #[test]
    fn test_entity_not_found_error() {
        let error = Error::EntityNotFound("e1".to_string());
        assert_eq!(error.code(), "E200");
        assert!(error.to_string().contains("e1"));
    }

    #[test]
    fn test_json_error_becomes_invalid_payload() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: Error = parse_err.into();
        assert!(matches!(error, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_config_error() {
        let error = Error::ConfigError("unknown key".into());
        assert_eq!(error.code(), "E600");
        assert_eq!(error.suggestion(), Some("kgviz config list".to_string()));
    }
}
