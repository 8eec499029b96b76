//! Structured outcome of a single store operation.
//!
//! A report is built per call and never shared. Builder methods take `self`
//! and return it so reports read like the error builders they replace:
//!
//! ```
//! use http::StatusCode;
//! use redigate_core::report;
//!
//! let report = report::new(StatusCode::INTERNAL_SERVER_ERROR)
//!     .with_message("increase_key failed")
//!     .with_debug("cause", "connection reset")
//!     .with_field("redis_key", "counter");
//!
//! assert!(!report.is_success());
//! assert_eq!(report.fields["redis_key"], "counter");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Status, message and context describing how an operation went
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    pub message: String,
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Diagnostic values such as the underlying cause
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub debug: BTreeMap<String, Value>,
    /// Caller-supplied context, e.g. the key the operation touched
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create a new report with the given status and its canonical reason as message
pub fn new<S>(status: S) -> OperationReport
where
    S: Into<StatusCode>,
{
    let status = status.into();
    OperationReport {
        status,
        message: status.canonical_reason().unwrap_or_default().to_string(),
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        debug: BTreeMap::new(),
        fields: BTreeMap::new(),
        error: None,
    }
}

/// 200 OK
pub fn ok() -> OperationReport {
    new(StatusCode::OK)
}

/// 503 for a store that is disabled or unreachable
pub fn unavailable() -> OperationReport {
    new(StatusCode::SERVICE_UNAVAILABLE).with_message("key-value store unavailable")
}

impl OperationReport {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Add a diagnostic value. Values that fail to serialize are dropped.
    pub fn with_debug<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.debug.insert(key.to_string(), value);
        }
        self
    }

    /// Add a custom field. Values that fail to serialize are dropped.
    pub fn with_field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn with_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.fields.extend(fields);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl fmt::Display for OperationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)?;
        if let Some(error) = &self.error {
            write!(f, ": {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for OperationReport {}

impl From<StatusCode> for OperationReport {
    fn from(status: StatusCode) -> Self {
        new(status)
    }
}

fn serialize_status<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_canonical_reason() {
        let report = new(StatusCode::OK);
        assert_eq!(report.message, "OK");
        assert!(report.is_success());
        assert!(report.error.is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(ok().request_id, ok().request_id);
    }

    #[test]
    fn test_display() {
        let report = unavailable().with_error("Redis is disabled");
        assert_eq!(
            report.to_string(),
            "503 key-value store unavailable: Redis is disabled"
        );
    }

    #[test]
    fn test_serializes_status_as_number_and_skips_empty_maps() {
        let json = serde_json::to_value(ok()).unwrap();
        assert_eq!(json["status"], 200);
        assert!(json.get("debug").is_none());
        assert!(json.get("fields").is_none());
        assert!(json.get("error").is_none());
    }
}
