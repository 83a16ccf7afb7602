use crate::domain::account::{Account, Balance};
use crate::domain::event::ReconciliationEvent;
use crate::domain::ports::{AccountStore, ReconciliationEventLog, TransactionStore};
use crate::domain::transaction::{TransactionRecord, TransactionStatus};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for accounts.
///
/// Uses `Arc<RwLock<HashMap<String, Account>>>` to allow shared concurrent access.
/// Conditional balance writes are checked and applied under the write lock.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(PaymentError::AccountExists(account.id));
        }
        accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(id).cloned())
    }

    async fn get_balance(&self, id: &str) -> Result<Balance> {
        let accounts = self.accounts.read().await;
        accounts
            .get(id)
            .map(|account| account.balance)
            .ok_or_else(|| PaymentError::AccountNotFound(id.to_string()))
    }

    async fn set_balance(&self, id: &str, value: Balance) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| PaymentError::AccountNotFound(id.to_string()))?;
        account.balance = value;
        Ok(())
    }

    async fn compare_and_set_balance(
        &self,
        id: &str,
        expected: Balance,
        new: Balance,
    ) -> Result<bool> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| PaymentError::AccountNotFound(id.to_string()))?;
        if account.balance != expected {
            return Ok(false);
        }
        account.balance = new;
        Ok(true)
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }
}

#[derive(Default)]
struct TransactionTable {
    records: HashMap<String, TransactionRecord>,
    idempotency_keys: HashSet<String>,
}

/// A thread-safe in-memory store for transaction records.
///
/// Records and the idempotency index live behind one lock so that creating a
/// record and claiming its key cannot be observed separately.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    table: Arc<RwLock<TransactionTable>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_oldest_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, record: TransactionRecord) -> Result<()> {
        let mut table = self.table.write().await;
        if table.idempotency_keys.contains(&record.idempotency_key) {
            return Err(PaymentError::DuplicateRequest(record.idempotency_key));
        }
        if table.records.contains_key(&record.id) {
            return Err(PaymentError::internal(format!(
                "transaction id {} already stored",
                record.id
            )));
        }
        table.idempotency_keys.insert(record.idempotency_key.clone());
        table.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>> {
        let table = self.table.read().await;
        Ok(table.records.get(id).cloned())
    }

    async fn update(&self, record: &TransactionRecord) -> Result<()> {
        let mut table = self.table.write().await;
        let stored = table
            .records
            .get_mut(&record.id)
            .ok_or_else(|| PaymentError::TransactionNotFound(record.id.clone()))?;
        *stored = record.clone();
        Ok(())
    }

    async fn update_if_status(
        &self,
        record: &TransactionRecord,
        expected: TransactionStatus,
    ) -> Result<bool> {
        let mut table = self.table.write().await;
        let stored = table
            .records
            .get_mut(&record.id)
            .ok_or_else(|| PaymentError::TransactionNotFound(record.id.clone()))?;
        if stored.status() != expected {
            return Ok(false);
        }
        *stored = record.clone();
        Ok(true)
    }

    async fn list_by_party(&self, user_id: &str) -> Result<Vec<TransactionRecord>> {
        let table = self.table.read().await;
        let mut records: Vec<_> = table
            .records
            .values()
            .filter(|record| record.involves(user_id))
            .cloned()
            .collect();
        sort_oldest_first(&mut records);
        Ok(records)
    }

    async fn exists_idempotency_key(&self, key: &str) -> Result<bool> {
        let table = self.table.read().await;
        Ok(table.idempotency_keys.contains(key))
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>> {
        let table = self.table.read().await;
        let mut records: Vec<_> = table.records.values().cloned().collect();
        sort_oldest_first(&mut records);
        Ok(records)
    }
}

/// Keeps reconciliation events in memory, in arrival order.
#[derive(Default, Clone)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<Vec<ReconciliationEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ReconciliationEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl ReconciliationEventLog for InMemoryEventLog {
    async fn append(&self, event: ReconciliationEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Amount;
    use crate::domain::event::EventType;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(payer: &str, receiver: &str, key: &str) -> TransactionRecord {
        TransactionRecord::new(payer, receiver, Amount::new(dec!(10)).unwrap(), key)
    }

    #[tokio::test]
    async fn test_in_memory_account_store() {
        let store = InMemoryAccountStore::new();
        let account = Account::open("alice", Balance::new(dec!(100.0))).unwrap();

        store.insert(account.clone()).await.unwrap();
        let retrieved = store.get("alice").await.unwrap().unwrap();
        assert_eq!(retrieved, account);

        assert!(store.get("bob").await.unwrap().is_none());
        assert!(matches!(
            store.insert(account).await,
            Err(PaymentError::AccountExists(_))
        ));
    }

    #[tokio::test]
    async fn test_balance_access_requires_existing_account() {
        let store = InMemoryAccountStore::new();
        assert!(matches!(
            store.get_balance("ghost").await,
            Err(PaymentError::AccountNotFound(_))
        ));
        assert!(matches!(
            store.set_balance("ghost", Balance::ZERO).await,
            Err(PaymentError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_compare_and_set_balance() {
        let store = InMemoryAccountStore::new();
        store
            .insert(Account::open("alice", Balance::new(dec!(100))).unwrap())
            .await
            .unwrap();

        let swapped = store
            .compare_and_set_balance("alice", Balance::new(dec!(100)), Balance::new(dec!(60)))
            .await
            .unwrap();
        assert!(swapped);

        // Stale expectation loses and leaves the balance untouched
        let swapped = store
            .compare_and_set_balance("alice", Balance::new(dec!(100)), Balance::new(dec!(20)))
            .await
            .unwrap();
        assert!(!swapped);
        assert_eq!(
            store.get_balance("alice").await.unwrap(),
            Balance::new(dec!(60))
        );
    }

    #[tokio::test]
    async fn test_create_claims_idempotency_key() {
        let store = InMemoryTransactionStore::new();
        let tx = record("a", "b", "k1");

        store.create(tx.clone()).await.unwrap();
        assert!(store.exists_idempotency_key("k1").await.unwrap());
        assert_eq!(store.get(&tx.id).await.unwrap().unwrap(), tx);

        let again = record("a", "b", "k1");
        assert!(matches!(
            store.create(again.clone()).await,
            Err(PaymentError::DuplicateRequest(_))
        ));
        assert!(store.get(&again.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_if_status() {
        let store = InMemoryTransactionStore::new();
        let mut tx = record("a", "b", "k1");
        store.create(tx.clone()).await.unwrap();

        tx.transition(TransactionStatus::Approved).unwrap();
        assert!(
            store
                .update_if_status(&tx, TransactionStatus::Pending)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_if_status(&tx, TransactionStatus::Pending)
                .await
                .unwrap()
        );
        let stored = store.get(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), TransactionStatus::Approved);
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let store = InMemoryTransactionStore::new();
        let tx = record("a", "b", "k1");
        assert!(matches!(
            store.update(&tx).await,
            Err(PaymentError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_party() {
        let store = InMemoryTransactionStore::new();
        let sent = record("alice", "bob", "k1");
        let received = record("carol", "alice", "k2");
        let unrelated = record("bob", "carol", "k3");
        for tx in [&sent, &received, &unrelated] {
            store.create(tx.clone()).await.unwrap();
        }

        let ids: Vec<_> = store
            .list_by_party("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&sent.id));
        assert!(ids.contains(&received.id));
        assert!(store.list_by_party("dave").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_log_appends_in_order() {
        let log = InMemoryEventLog::new();
        log.append(ReconciliationEvent::applied(
            json!({"n": 1}),
            TransactionStatus::Approved,
        ))
        .await
        .unwrap();
        log.append(ReconciliationEvent::rejected(json!({"n": 2}), "boom"))
            .await
            .unwrap();

        let events = log.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Approved);
        assert_eq!(events[1].event_type, EventType::Error);
    }
}
