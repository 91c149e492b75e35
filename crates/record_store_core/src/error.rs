use std::fmt;

use thiserror::Error;

/// Request input rejected before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    GetItem,
    PutItem,
    Scan,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GetItem => "GetItem",
            Self::PutItem => "PutItem",
            Self::Scan => "Scan",
        };
        f.write_str(name)
    }
}

/// Failures raised by a table service. The client never catches these; they
/// travel to the adapter boundary untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed: {message}")]
    Backend {
        operation: StoreOperation,
        message: String,
    },
    #[error("{operation} returned an item that could not be converted: {message}")]
    Codec {
        operation: StoreOperation,
        message: String,
    },
}

impl StoreError {
    pub fn backend(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }

    pub fn codec(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::Codec {
            operation,
            message: message.into(),
        }
    }

    pub fn operation(&self) -> StoreOperation {
        match self {
            Self::Backend { operation, .. } | Self::Codec { operation, .. } => *operation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
