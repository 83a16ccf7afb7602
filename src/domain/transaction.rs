use super::account::Amount;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Failed => "failed",
        }
    }

    /// `Approved` and `Failed` admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A peer-to-peer transfer and its lifecycle.
///
/// Funds are taken from the payer before the record exists, so a freshly
/// built record is `Pending` with `is_amount_deducted` set. The record then
/// moves to a terminal status exactly once, through [`Self::transition`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub id: String,
    pub payer_id: String,
    pub receiver_id: String,
    pub amount: Amount,
    status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: String,
    is_amount_deducted: bool,
}

impl TransactionRecord {
    pub fn new(
        payer_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: Amount,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payer_id: payer_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            idempotency_key: idempotency_key.into(),
            is_amount_deducted: true,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_amount_deducted(&self) -> bool {
        self.is_amount_deducted
    }

    /// Moves a pending record to `to`.
    ///
    /// Fails with `AlreadyFinalized` when the record is terminal and with
    /// `InvalidTransition` when `to` is `Pending`.
    pub fn transition(&mut self, to: TransactionStatus) -> Result<(), PaymentError> {
        if self.status.is_terminal() {
            return Err(PaymentError::AlreadyFinalized(self.status));
        }
        if !to.is_terminal() {
            return Err(PaymentError::InvalidTransition(to));
        }
        self.status = to;
        Ok(())
    }

    /// Records that the payer's deduction has been given back.
    pub fn mark_refunded(&mut self) {
        self.is_amount_deducted = false;
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.payer_id == user_id || self.receiver_id == user_id
    }
}

/// Result of a successful transfer initiation.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TransferReceipt {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&TransactionRecord> for TransferReceipt {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            transaction_id: record.id.clone(),
            status: record.status,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// A transaction as seen from one of its parties.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TransactionSummary {
    pub transaction_id: String,
    pub direction: Direction,
    pub amount: Amount,
    pub status: TransactionStatus,
}

impl TransactionSummary {
    pub fn for_user(record: &TransactionRecord, user_id: &str) -> Self {
        let direction = if record.payer_id == user_id {
            Direction::Sent
        } else {
            Direction::Received
        };
        Self {
            transaction_id: record.id.clone(),
            direction,
            amount: record.amount,
            status: record.status,
        }
    }
}
