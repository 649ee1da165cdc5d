use thiserror::Error;

/// Errors surfaced by loading, lookups and trade commits.
///
/// Decisions that simply find no valid option never produce an error; they
/// return `None` or an empty collection instead.
#[derive(Debug, Error)]
pub enum UncivError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Unknown civilization: {0}")]
    UnknownCivilization(String),
    #[error("Unknown city: {0}")]
    UnknownCity(String),
    #[error("Invalid trade between [{0}] and [{1}]")]
    InvalidTrade(String, String),
}

pub type Result<T> = std::result::Result<T, UncivError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = UncivError::UnknownCivilization("Rome".to_string());
        assert_eq!(err.to_string(), "Unknown civilization: Rome");

        let err = UncivError::InvalidTrade("Rome".to_string(), "Greece".to_string());
        assert_eq!(err.to_string(), "Invalid trade between [Rome] and [Greece]");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: UncivError = parse.unwrap_err().into();
        assert!(matches!(err, UncivError::Json(_)));
    }
}
