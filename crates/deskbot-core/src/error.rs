use thiserror::Error;

/// Top-level error type for the Deskbot system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for DeskbotError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeskbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DeskbotError {
    fn from(err: toml::de::Error) -> Self {
        DeskbotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DeskbotError {
    fn from(err: toml::ser::Error) -> Self {
        DeskbotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DeskbotError {
    fn from(err: serde_json::Error) -> Self {
        DeskbotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Deskbot operations.
pub type Result<T> = std::result::Result<T, DeskbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeskbotError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(DeskbotError, &str)> = vec![
            (
                DeskbotError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                DeskbotError::Chat("session lock poisoned".to_string()),
                "Chat error: session lock poisoned",
            ),
            (
                DeskbotError::Retrieval("backend down".to_string()),
                "Retrieval error: backend down",
            ),
            (
                DeskbotError::Generation("model not loaded".to_string()),
                "Generation error: model not loaded",
            ),
            (
                DeskbotError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                DeskbotError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DeskbotError = io_err.into();
        assert!(matches!(err, DeskbotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: DeskbotError = parsed.unwrap_err().into();
        assert!(matches!(err, DeskbotError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: DeskbotError = parsed.unwrap_err().into();
        assert!(matches!(err, DeskbotError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
