use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Partition key attribute. Always equal to the record identifier.
pub const PARTITION_KEY: &str = "pk";
/// Sort key attribute. Always equal to the record identifier.
pub const SORT_KEY: &str = "sk";

pub const MISSING_ID_MESSAGE: &str = "Missing id in request params";
pub const NON_OBJECT_BODY_MESSAGE: &str = "Request body must be a JSON object";

/// Opaque field mapping stored under one identifier.
pub type Record = Map<String, Value>;

/// Composite table key. Both components carry the same identifier, so the
/// table's `(pk, sk)` pair degenerates to a single effective key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pk: String,
    sk: String,
}

impl RecordKey {
    pub fn for_id(id: &str) -> Self {
        Self {
            pk: id.to_string(),
            sk: id.to_string(),
        }
    }

    pub fn pk(&self) -> &str {
        &self.pk
    }

    pub fn sk(&self) -> &str {
        &self.sk
    }

    /// Reads the key back out of a stored item, if both components are strings.
    pub fn from_record(record: &Record) -> Option<Self> {
        let pk = record.get(PARTITION_KEY)?.as_str()?;
        let sk = record.get(SORT_KEY)?.as_str()?;
        Some(Self {
            pk: pk.to_string(),
            sk: sk.to_string(),
        })
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(PARTITION_KEY.to_string(), Value::from(self.pk.clone()));
        record.insert(SORT_KEY.to_string(), Value::from(self.sk.clone()));
        record
    }
}

/// Overwrites `pk` and `sk` on `payload` with `id`, whatever the caller sent.
pub fn inject_key(mut payload: Record, id: &str) -> Record {
    payload.insert(PARTITION_KEY.to_string(), Value::from(id));
    payload.insert(SORT_KEY.to_string(), Value::from(id));
    payload
}

/// Uniform `{valid, data}` result shape. An absent `data` is omitted from the
/// serialized form, so a not-found read renders as `{"valid":false}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn valid(data: T) -> Self {
        Self {
            valid: true,
            data: Some(data),
        }
    }

    pub fn new(valid: bool, data: Option<T>) -> Self {
        Self { valid, data }
    }
}

impl Envelope<String> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            data: Some(message.into()),
        }
    }
}

/// Rejects absent or blank identifiers before any remote call is made.
pub fn require_id(id: Option<&str>) -> Result<&str, ValidationError> {
    match id {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ValidationError::new(MISSING_ID_MESSAGE)),
    }
}

/// Interprets a raw request body as a record payload. An empty body is an
/// empty record; anything other than a JSON object is rejected.
pub fn parse_payload(body: &[u8]) -> Result<Record, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::new());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|error| ValidationError::new(format!("Malformed JSON body: {error}")))?;
    match value {
        Value::Object(record) => Ok(record),
        _ => Err(ValidationError::new(NON_OBJECT_BODY_MESSAGE)),
    }
}
