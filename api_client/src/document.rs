//! Typed-field document shapes used by the store's REST surface.
//!
//! Documents are decoded into plain records here; a missing or mistyped
//! required field is reported as [`ApiClientError::RemoteRead`] instead of
//! leaking a half-filled record to callers.

use crate::ApiClientError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
    create_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryRow {
    pub document: Option<Document>,
}

pub(crate) fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

pub(crate) fn nullable_value(value: Option<&str>) -> Value {
    match value {
        Some(v) => string_value(v),
        None => json!({ "nullValue": null }),
    }
}

impl Document {
    pub fn id(&self) -> Result<&str, ApiClientError> {
        self.name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiClientError::RemoteRead(format!("invalid document name: {}", self.name)))
    }

    pub fn string(&self, key: &str) -> Result<String, ApiClientError> {
        self.fields
            .get(key)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.malformed(key))
    }

    /// Absent fields and `nullValue` both read as `None`.
    pub fn nullable_string(&self, key: &str) -> Result<Option<String>, ApiClientError> {
        let Some(value) = self.fields.get(key) else {
            return Ok(None);
        };
        if value.get("nullValue").is_some() {
            return Ok(None);
        }
        value
            .get("stringValue")
            .and_then(Value::as_str)
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| self.malformed(key))
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>, ApiClientError> {
        let raw = self
            .fields
            .get("createdAt")
            .and_then(|v| v.get("timestampValue"))
            .and_then(Value::as_str)
            .or(self.create_time.as_deref())
            .ok_or_else(|| self.malformed("createTime"))?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ApiClientError::RemoteRead(format!("bad timestamp {}: {}", raw, e)))
    }

    fn malformed(&self, key: &str) -> ApiClientError {
        ApiClientError::RemoteRead(format!(
            "document {} is missing field '{}' or it has the wrong type",
            self.name, key
        ))
    }
}
