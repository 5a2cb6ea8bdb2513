use crate::receiver::ReceiverSnapshot;
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("transport failure for {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },
    #[error("malformed report from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
    #[error("report from {endpoint} is missing {field}")]
    MissingField {
        endpoint: String,
        field: &'static str,
    },
}

/// Capability that produces a fresh snapshot for a station endpoint.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<ReceiverSnapshot, TelemetryError>;
}
