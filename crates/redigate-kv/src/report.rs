//! Result-plus-report pairs for application callers.

use std::collections::BTreeMap;
use std::time::Duration;

use redigate_core::report::{self, OperationReport};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::KvError;
use crate::services::SafeDefault;

/// Name and context of a call, copied into its report
#[derive(Debug, Clone, Default)]
pub struct Operation {
    name: String,
    fields: BTreeMap<String, Value>,
    verbose: bool,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach a custom field. Values that fail to serialize are dropped.
    pub fn with_field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn key(self, key: &str) -> Self {
        self.with_field("redis_key", key)
    }

    pub fn field(self, field: &str) -> Self {
        self.with_field("redis_field", field)
    }

    pub fn channel(self, channel: &str) -> Self {
        self.with_field("redis_channel", channel)
    }

    pub fn timeout(self, ttl: Duration) -> Self {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.with_field("redis_timeout_ms", millis)
    }

    /// Log failures at error level instead of debug
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

/// A value together with the report describing how it was obtained.
/// On failure `value` holds the safe default for `T`.
#[derive(Debug, Clone, Serialize)]
pub struct Reported<T> {
    pub value: T,
    pub report: OperationReport,
}

impl<T: SafeDefault> Reported<T> {
    pub fn capture(operation: &Operation, result: Result<T, KvError>) -> Self {
        match result {
            Ok(value) => Self {
                value,
                report: report::ok().with_fields(operation.fields.clone()),
            },
            Err(e) => {
                if operation.verbose {
                    error!("{} failed: {}", operation.name, e);
                } else {
                    debug!("{} failed: {}", operation.name, e);
                }

                let report = OperationReport::from(&e)
                    .with_message(format!("{} failed", operation.name))
                    .with_debug("cause", e.to_string())
                    .with_fields(operation.fields.clone());

                Self {
                    value: T::safe_default(),
                    report,
                }
            }
        }
    }

    /// Safe default with a 503 report, for calls that were never attempted
    pub fn unavailable(operation: &Operation) -> Self {
        Self {
            value: T::safe_default(),
            report: report::unavailable()
                .with_debug("operation", operation.name())
                .with_fields(operation.fields.clone()),
        }
    }
}

impl<T> Reported<T> {
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }

    pub fn into_result(self) -> Result<T, OperationReport> {
        if self.report.is_success() {
            Ok(self.value)
        } else {
            Err(self.report)
        }
    }
}
