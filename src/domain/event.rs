use super::transaction::TransactionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Approved,
    Failed,
    Pending,
    Error,
}

impl From<TransactionStatus> for EventType {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => EventType::Pending,
            TransactionStatus::Approved => EventType::Approved,
            TransactionStatus::Failed => EventType::Failed,
        }
    }
}

/// One gateway callback as it was received, with its outcome.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ReconciliationEvent {
    pub id: String,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReconciliationEvent {
    pub fn applied(payload: Value, status: TransactionStatus) -> Self {
        Self::new(payload, status.into(), None)
    }

    pub fn rejected(payload: Value, message: impl Into<String>) -> Self {
        Self::new(payload, EventType::Error, Some(message.into()))
    }

    fn new(payload: Value, event_type: EventType, message: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            received_at: Utc::now(),
            event_type,
            message,
        }
    }
}
