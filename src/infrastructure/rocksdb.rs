use crate::domain::account::{Account, Balance};
use crate::domain::event::ReconciliationEvent;
use crate::domain::ports::{AccountStore, ReconciliationEventLog, TransactionStore};
use crate::domain::transaction::{TransactionRecord, TransactionStatus};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for the idempotency-key index.
pub const CF_IDEMPOTENCY_KEYS: &str = "idempotency_keys";
/// Column Family for the append-only reconciliation events.
pub const CF_EVENTS: &str = "reconciliation_events";

/// A persistent store implementation using RocksDB.
///
/// Implements all three ports on separate Column Families. Read-compare-write
/// sequences (conditional updates, record creation) run under a write lock
/// shared by every clone, so they are atomic for writers in this process.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_ACCOUNTS, CF_TRANSACTIONS, CF_IDEMPOTENCY_KEYS, CF_EVENTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::internal(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(&cf, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            items.push(serde_json::from_slice(&value)?);
        }
        Ok(items)
    }

    fn read_account(&self, id: &str) -> Result<Account> {
        self.read(CF_ACCOUNTS, id)?
            .ok_or_else(|| PaymentError::AccountNotFound(id.to_string()))
    }

    fn read_record(&self, id: &str) -> Result<TransactionRecord> {
        self.read(CF_TRANSACTIONS, id)?
            .ok_or_else(|| PaymentError::TransactionNotFound(id.to_string()))
    }
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn insert(&self, account: Account) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read::<Account>(CF_ACCOUNTS, &account.id)?.is_some() {
            return Err(PaymentError::AccountExists(account.id));
        }
        self.write(CF_ACCOUNTS, &account.id, &account)
    }

    async fn get(&self, id: &str) -> Result<Option<Account>> {
        self.read(CF_ACCOUNTS, id)
    }

    async fn get_balance(&self, id: &str) -> Result<Balance> {
        Ok(self.read_account(id)?.balance)
    }

    async fn set_balance(&self, id: &str, value: Balance) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut account = self.read_account(id)?;
        account.balance = value;
        self.write(CF_ACCOUNTS, id, &account)
    }

    async fn compare_and_set_balance(
        &self,
        id: &str,
        expected: Balance,
        new: Balance,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut account = self.read_account(id)?;
        if account.balance != expected {
            return Ok(false);
        }
        account.balance = new;
        self.write(CF_ACCOUNTS, id, &account)?;
        Ok(true)
    }

    async fn all(&self) -> Result<Vec<Account>> {
        self.scan(CF_ACCOUNTS)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn create(&self, record: TransactionRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let keys = self.cf(CF_IDEMPOTENCY_KEYS)?;
        let transactions = self.cf(CF_TRANSACTIONS)?;

        if self
            .db
            .get_pinned_cf(&keys, record.idempotency_key.as_bytes())?
            .is_some()
        {
            return Err(PaymentError::DuplicateRequest(record.idempotency_key));
        }

        // Record and key land in one batch
        let mut batch = WriteBatch::default();
        batch.put_cf(&transactions, record.id.as_bytes(), serde_json::to_vec(&record)?);
        batch.put_cf(
            &keys,
            record.idempotency_key.as_bytes(),
            serde_json::to_vec(&record.created_at)?,
        );
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>> {
        self.read(CF_TRANSACTIONS, id)
    }

    async fn update(&self, record: &TransactionRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.read_record(&record.id)?;
        self.write(CF_TRANSACTIONS, &record.id, record)
    }

    async fn update_if_status(
        &self,
        record: &TransactionRecord,
        expected: TransactionStatus,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.read_record(&record.id)?.status() != expected {
            return Ok(false);
        }
        self.write(CF_TRANSACTIONS, &record.id, record)?;
        Ok(true)
    }

    async fn list_by_party(&self, user_id: &str) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self
            .scan::<TransactionRecord>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|record| record.involves(user_id))
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn exists_idempotency_key(&self, key: &str) -> Result<bool> {
        let cf = self.cf(CF_IDEMPOTENCY_KEYS)?;
        // Just check if the key exists without retrieving the value
        Ok(self.db.get_pinned_cf(&cf, key.as_bytes())?.is_some())
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self.scan(CF_TRANSACTIONS)?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }
}

#[async_trait]
impl ReconciliationEventLog for RocksDBStore {
    async fn append(&self, event: ReconciliationEvent) -> Result<()> {
        // Timestamp prefix keeps iteration in arrival order
        let key = format!(
            "{:020}-{}",
            event.received_at.timestamp_micros(),
            event.id
        );
        self.write(CF_EVENTS, &key, &event)
    }
}

impl RocksDBStore {
    /// Reads back every stored reconciliation event, oldest first.
    pub fn events(&self) -> Result<Vec<ReconciliationEvent>> {
        self.scan(CF_EVENTS)
    }
}
