use thiserror::Error;

/// Failures of the migration decode path. Every variant is a deterministic
/// function of the input; nothing here is worth retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("invalid transport: {0}")]
    InvalidTransport(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("account #{index} has an empty secret")]
    EmptySecret { index: usize },
}

impl MigrationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        MigrationError::MalformedPayload(msg.into())
    }

    /// Short label for console diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrationError::InvalidTransport(_) => "invalid transport",
            MigrationError::MalformedPayload(_) => "malformed payload",
            MigrationError::EmptySecret { .. } => "empty secret",
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
