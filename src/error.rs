//! Error handling for jqsh
//!
//! Data-driven failures (unknown names, type mismatches, ...) are not Rust
//! errors: they travel through channels as [`Exception`](crate::values::Exception)
//! values. The types here cover everything else: channel protocol
//! violations, configuration, I/O and internal faults.

use crate::channel::ChannelError;
use thiserror::Error;

/// Main error type for jqsh operations
#[derive(Error, Debug)]
pub enum JqshError {
    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors converting between jqsh values and JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors parsing TOML configuration
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value that has no JSON form (exceptions)
    #[error("Value is not serializable: {0}")]
    NotSerializable(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A defect inside a node's own logic
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<JqshError>,
    },
}

impl JqshError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        JqshError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a cancelled channel operation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            JqshError::Channel(ChannelError::Cancelled) => true,
            JqshError::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type alias for jqsh operations
pub type Result<T> = std::result::Result<T, JqshError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<JqshError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JqshError::Config("missing section".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing section");
    }

    #[test]
    fn test_error_with_context() {
        let err = JqshError::Internal("boom".to_string());
        let with_ctx = err.with_context("Failed to evaluate");
        assert!(with_ctx.to_string().contains("Failed to evaluate"));
        assert!(with_ctx.to_string().contains("boom"));
    }

    #[test]
    fn test_channel_error_converts() {
        let result: std::result::Result<(), ChannelError> = Err(ChannelError::Closed);
        let err = result.context("pushing value").unwrap_err();
        assert!(err.to_string().starts_with("pushing value"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_is_cancelled_through_context() {
        let err = JqshError::from(ChannelError::Cancelled).with_context("pop");
        assert!(err.is_cancelled());
    }
}
