use crate::error::ConfigError;

pub const TABLE_NAME_VAR: &str = "DYNAMODB_TABLE";
pub const ENDPOINT_VAR: &str = "DYNAMODB_ENDPOINT";
pub const TIMEOUT_MS_VAR: &str = "DYNAMODB_TIMEOUT_MS";
pub const REDACT_ERRORS_VAR: &str = "RECORD_STORE_REDACT_ERRORS";

/// How much of an internal failure reaches the caller in a 500 body. The full
/// detail is always logged together with the correlation id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorDisclosure {
    /// The error message is returned as the envelope `data`.
    #[default]
    Verbose,
    /// Only a generic message carrying the correlation id is returned.
    Redacted,
}

impl ErrorDisclosure {
    pub fn public_message(self, internal_message: &str, correlation_id: &str) -> String {
        match self {
            Self::Verbose => internal_message.to_string(),
            Self::Redacted => format!("internal error (correlation id {correlation_id})"),
        }
    }
}

/// Store configuration, read once per process or per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub table_name: String,
    /// Endpoint override, e.g. a local DynamoDB or LocalStack.
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub disclosure: ErrorDisclosure,
}

impl StoreSettings {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            endpoint: None,
            timeout_ms: None,
            disclosure: ErrorDisclosure::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parses settings from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let table_name = read(TABLE_NAME_VAR).ok_or(ConfigError::Missing(TABLE_NAME_VAR))?;

        let timeout_ms = read(TIMEOUT_MS_VAR)
            .map(|value| {
                value.parse::<u64>().map_err(|error| ConfigError::Invalid {
                    var: TIMEOUT_MS_VAR,
                    value: value.clone(),
                    reason: error.to_string(),
                })
            })
            .transpose()?;

        let disclosure = match read(REDACT_ERRORS_VAR) {
            None => ErrorDisclosure::Verbose,
            Some(value) => match parse_flag(&value) {
                Some(true) => ErrorDisclosure::Redacted,
                Some(false) => ErrorDisclosure::Verbose,
                None => {
                    return Err(ConfigError::Invalid {
                        var: REDACT_ERRORS_VAR,
                        value,
                        reason: "expected true or false".to_string(),
                    })
                }
            },
        };

        Ok(Self {
            table_name,
            endpoint: read(ENDPOINT_VAR),
            timeout_ms,
            disclosure,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
