//! Domain-specific errors.

use thiserror::Error;

/// Errors raised while constructing or interpreting domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("pattern must not be empty")]
    EmptyPattern,
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
    #[error("malformed result line '{0}': expected <path>:<line>")]
    MalformedResultLine(String),
    #[error("invalid menu choice '{0}'")]
    InvalidMenuChoice(String),
    #[error("could not determine an identifier from pattern '{0}'")]
    UnextractableIdentifier(String),
}

/// Failures that end an operation or the whole session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing required tools: {}", .0.join(", "))]
    MissingCapability(Vec<String>),
    /// Raw matcher diagnostics, kept verbatim.
    #[error("{diagnostic}")]
    SearchFailure { diagnostic: String },
    #[error("no patterns provided")]
    NoPatternsProvided,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        Self::Other(value.into())
    }
}
