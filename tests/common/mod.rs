#![allow(dead_code)]

use async_trait::async_trait;
use payflow::application::engine::PaymentEngine;
use payflow::config::EngineConfig;
use payflow::domain::account::{Account, Balance};
use payflow::domain::event::ReconciliationEvent;
use payflow::domain::ports::{
    AccountStore, AccountStoreRef, EventLogRef, ReconciliationEventLog, TransactionStore,
    TransactionStoreRef,
};
use payflow::domain::transaction::{TransactionRecord, TransactionStatus};
use payflow::error::{PaymentError, Result};
use payflow::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryEventLog, InMemoryTransactionStore,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const SCRIPT_HEADER: &str = "type, account, counterparty, amount, reference, status";

/// Engine over fresh in-memory stores, plus a handle on its event log.
pub fn in_memory_engine() -> (PaymentEngine, InMemoryEventLog) {
    in_memory_engine_with(EngineConfig::default())
}

pub fn in_memory_engine_with(config: EngineConfig) -> (PaymentEngine, InMemoryEventLog) {
    let events = InMemoryEventLog::new();
    let engine = PaymentEngine::new(
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryTransactionStore::new()),
        Arc::new(events.clone()),
        config,
    );
    (engine, events)
}

pub fn engine_with_stores(
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    events: EventLogRef,
) -> PaymentEngine {
    PaymentEngine::new(accounts, transactions, events, EngineConfig::default())
}

fn offline(what: &str) -> PaymentError {
    PaymentError::IoError(std::io::Error::other(format!("{what} offline")))
}

/// In-memory accounts with switchable write faults.
#[derive(Default)]
pub struct FaultyAccountStore {
    inner: InMemoryAccountStore,
    broken_account: Mutex<Option<String>>,
    lost_credits: AtomicU32,
}

impl FaultyAccountStore {
    /// Makes every balance write to `id` fail until [`Self::repair`].
    pub fn break_account(&self, id: &str) {
        *self.broken_account.lock().unwrap() = Some(id.to_string());
    }

    pub fn repair(&self) {
        *self.broken_account.lock().unwrap() = None;
    }

    /// Makes the next `n` balance increases lose their compare-and-set.
    pub fn lose_credits(&self, n: u32) {
        self.lost_credits.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStore for FaultyAccountStore {
    async fn insert(&self, account: Account) -> Result<()> {
        self.inner.insert(account).await
    }

    async fn get(&self, id: &str) -> Result<Option<Account>> {
        self.inner.get(id).await
    }

    async fn get_balance(&self, id: &str) -> Result<Balance> {
        self.inner.get_balance(id).await
    }

    async fn set_balance(&self, id: &str, value: Balance) -> Result<()> {
        self.inner.set_balance(id, value).await
    }

    async fn compare_and_set_balance(
        &self,
        id: &str,
        expected: Balance,
        new: Balance,
    ) -> Result<bool> {
        if self.broken_account.lock().unwrap().as_deref() == Some(id) {
            return Err(offline("account store"));
        }
        if new > expected
            && self
                .lost_credits
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Ok(false);
        }
        self.inner.compare_and_set_balance(id, expected, new).await
    }

    async fn all(&self) -> Result<Vec<Account>> {
        self.inner.all().await
    }
}

/// In-memory transactions whose reads or creates can be made to fail.
#[derive(Default)]
pub struct FaultyTransactionStore {
    inner: InMemoryTransactionStore,
    pub fail_reads: AtomicBool,
    pub fail_creates: AtomicBool,
}

#[async_trait]
impl TransactionStore for FaultyTransactionStore {
    async fn create(&self, record: TransactionRecord) -> Result<()> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(offline("transaction store"));
        }
        self.inner.create(record).await
    }

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(offline("transaction store"));
        }
        self.inner.get(id).await
    }

    async fn update(&self, record: &TransactionRecord) -> Result<()> {
        self.inner.update(record).await
    }

    async fn update_if_status(
        &self,
        record: &TransactionRecord,
        expected: TransactionStatus,
    ) -> Result<bool> {
        self.inner.update_if_status(record, expected).await
    }

    async fn list_by_party(&self, user_id: &str) -> Result<Vec<TransactionRecord>> {
        self.inner.list_by_party(user_id).await
    }

    async fn exists_idempotency_key(&self, key: &str) -> Result<bool> {
        self.inner.exists_idempotency_key(key).await
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>> {
        self.inner.all().await
    }
}

/// An event log that rejects every append.
pub struct UnavailableEventLog;

#[async_trait]
impl ReconciliationEventLog for UnavailableEventLog {
    async fn append(&self, _event: ReconciliationEvent) -> Result<()> {
        Err(offline("event log"))
    }
}

/// Opens each `(id, balance)` pair on the engine.
pub async fn open_accounts(engine: &PaymentEngine, accounts: &[(&str, Decimal)]) {
    for (id, balance) in accounts {
        engine.open_account(id, *balance).await.unwrap();
    }
}

pub fn gateway_payload(transaction_id: &str, status: &str, amount: Decimal) -> Value {
    json!({
        "transaction_id": transaction_id,
        "status": status,
        "amount": amount.to_string(),
    })
}

/// Writes a command script with the standard header followed by `rows`.
pub fn write_script(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{SCRIPT_HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// Sum of every account balance.
pub async fn total_balance(engine: &PaymentEngine) -> Decimal {
    engine
        .accounts()
        .await
        .unwrap()
        .iter()
        .map(|account| account.balance.value())
        .sum()
}
