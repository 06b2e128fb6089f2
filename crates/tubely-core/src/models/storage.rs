use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use thiserror::Error;

/// Separator between bucket and key in the persisted form of a reference.
pub const REFERENCE_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceDecodeError {
    #[error("storage reference must have exactly 2 fields, found {0}")]
    FieldCount(usize),

    #[error("storage reference {0} is empty")]
    EmptyField(&'static str),

    #[error("storage reference {0} contains the delimiter")]
    ContainsDelimiter(&'static str),
}

/// Durable location of an uploaded object: a bucket and a key within it.
///
/// Persisted as `bucket,key`. Neither field may be empty or contain the delimiter,
/// so every reference that can be constructed round-trips through `encode`/`decode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageReference {
    bucket: String,
    key: String,
}

impl StorageReference {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, ReferenceDecodeError> {
        let bucket = bucket.into();
        let key = key.into();
        check_field("bucket", &bucket)?;
        check_field("key", &key)?;
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn encode(&self) -> String {
        format!("{}{}{}", self.bucket, REFERENCE_DELIMITER, self.key)
    }

    pub fn decode(value: &str) -> Result<Self, ReferenceDecodeError> {
        let fields: Vec<&str> = value.split(REFERENCE_DELIMITER).collect();
        if fields.len() != 2 {
            return Err(ReferenceDecodeError::FieldCount(fields.len()));
        }
        Self::new(fields[0], fields[1])
    }
}

fn check_field(name: &'static str, value: &str) -> Result<(), ReferenceDecodeError> {
    if value.is_empty() {
        return Err(ReferenceDecodeError::EmptyField(name));
    }
    if value.contains(REFERENCE_DELIMITER) {
        return Err(ReferenceDecodeError::ContainsDelimiter(name));
    }
    Ok(())
}

impl Display for StorageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}{}", self.bucket, REFERENCE_DELIMITER, self.key)
    }
}

impl FromStr for StorageReference {
    type Err = ReferenceDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
