//! Error types for the key-value layer

use http::StatusCode;
use redigate_core::report::{self, OperationReport};
use thiserror::Error;

/// Errors that can occur while talking to the key-value store
#[derive(Error, Debug)]
pub enum KvError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Key-value store is disabled")]
    Disabled,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Unsupported value type: {0}")]
    UnsupportedType(String),
}

impl KvError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            KvError::Disabled | KvError::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            KvError::Serialization(_) => StatusCode::BAD_REQUEST,
            KvError::UnsupportedType(_) => StatusCode::UNPROCESSABLE_ENTITY,
            KvError::Redis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&KvError> for OperationReport {
    fn from(error: &KvError) -> Self {
        let title = match error {
            KvError::Redis(_) => "Redis Error",
            KvError::Serialization(_) => "Serialization Error",
            KvError::Disabled => "Service Unavailable",
            KvError::ConnectionFailed(_) => "Connection Failed",
            KvError::UnsupportedType(_) => "Unsupported Type",
        };

        report::new(error.status_code())
            .with_message(title)
            .with_error(error)
    }
}

impl From<KvError> for OperationReport {
    fn from(error: KvError) -> Self {
        OperationReport::from(&error)
    }
}
