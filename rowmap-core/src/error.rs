use crate::Error;
use std::fmt::{self, Display};

/// Returned when a query expected to produce (or affect) a row found none:
/// `query_one` with zero rows, `update` and `delete` affecting zero rows.
///
/// It survives context wrapping, test for it with [`is_record_not_found`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordNotFound;

impl Display for RecordNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rowmap: record not found")
    }
}

impl std::error::Error for RecordNotFound {}

/// Returned by a chunk callback to stop the iteration early. The iteration
/// then completes successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortIteration;

impl Display for AbortIteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rowmap: abort iteration, should only be used inside query_chunks callbacks")
    }
}

impl std::error::Error for AbortIteration {}

/// A misconfiguration detected before any statement reaches the database:
/// invalid table descriptor, record metadata, join layout, delete key or
/// chunk size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rowmap: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

pub fn is_record_not_found(error: &Error) -> bool {
    error.is::<RecordNotFound>()
}

pub fn is_config_error(error: &Error) -> bool {
    error.is::<ConfigError>()
}

pub(crate) fn config_error(message: impl Into<String>) -> Error {
    Error::new(ConfigError::new(message))
}
