use thiserror::Error;

/// Top-level error type for the Cambium system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for CambiumError`
/// so that the `?` operator works seamlessly across crate boundaries.
///
/// Three variants carry the user-facing failure taxonomy:
/// - `DataLoad`: the source directory is missing, empty, or yielded no
///   parsable documents. Fatal at startup.
/// - `Config`: required credentials or settings are absent. Fatal at startup.
/// - `Generation`: a reply call to the LLM failed. Recoverable; the pending
///   user turn stays in the transcript so the next submit can retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CambiumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CambiumError {
    fn from(err: toml::de::Error) -> Self {
        CambiumError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CambiumError {
    fn from(err: toml::ser::Error) -> Self {
        CambiumError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CambiumError {
    fn from(err: serde_json::Error) -> Self {
        CambiumError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Cambium operations.
pub type Result<T> = std::result::Result<T, CambiumError>;
