use super::account::{Account, Balance};
use super::event::ReconciliationEvent;
use super::transaction::{TransactionRecord, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Provisions a new account. Fails with `AccountExists` on a taken id.
    async fn insert(&self, account: Account) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Account>>;
    /// Fails with `AccountNotFound` if the account does not exist.
    async fn get_balance(&self, id: &str) -> Result<Balance>;
    /// Fails with `AccountNotFound` if the account does not exist.
    async fn set_balance(&self, id: &str, value: Balance) -> Result<()>;
    /// Writes `new` only if the stored balance still equals `expected`.
    ///
    /// Returns `false` when another writer got there first.
    async fn compare_and_set_balance(
        &self,
        id: &str,
        expected: Balance,
        new: Balance,
    ) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new record and claims its idempotency key in one step.
    ///
    /// Fails with `DuplicateRequest` if the key is already claimed.
    async fn create(&self, record: TransactionRecord) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>>;
    /// Overwrites status and deduction flag of an existing record.
    async fn update(&self, record: &TransactionRecord) -> Result<()>;
    /// Like `update`, but only while the stored status equals `expected`.
    async fn update_if_status(
        &self,
        record: &TransactionRecord,
        expected: TransactionStatus,
    ) -> Result<bool>;
    /// Records where `user_id` is payer or receiver, oldest first.
    async fn list_by_party(&self, user_id: &str) -> Result<Vec<TransactionRecord>>;
    async fn exists_idempotency_key(&self, key: &str) -> Result<bool>;
    async fn all(&self) -> Result<Vec<TransactionRecord>>;
}

/// Append-only sink for gateway callbacks. Never read back by the engine.
#[async_trait]
pub trait ReconciliationEventLog: Send + Sync {
    async fn append(&self, event: ReconciliationEvent) -> Result<()>;
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type EventLogRef = Arc<dyn ReconciliationEventLog>;
