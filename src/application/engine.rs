use super::balances::BalanceUpdater;
use super::queries::TransactionQueries;
use super::reconciliation::ReconciliationService;
use super::transfer::TransferService;
use crate::config::EngineConfig;
use crate::domain::account::{Account, Balance};
use crate::domain::ports::{AccountStoreRef, EventLogRef, TransactionStoreRef};
use crate::domain::transaction::{
    TransactionRecord, TransactionStatus, TransactionSummary, TransferReceipt,
};
use crate::error::Result;
use rust_decimal::Decimal;
use serde_json::Value;

/// The main entry point for the transfer engine.
///
/// `PaymentEngine` wires the transfer, reconciliation and query services to
/// one set of stores. It is cheap to clone; clones share the stores, so one
/// engine can serve concurrent requests from many tasks.
#[derive(Clone)]
pub struct PaymentEngine {
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    transfers: TransferService,
    reconciliation: ReconciliationService,
    queries: TransactionQueries,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `accounts` - The store for account balances.
    /// * `transactions` - The store for transaction records and idempotency keys.
    /// * `events` - The sink for reconciliation events.
    /// * `config` - Engine tuning.
    pub fn new(
        accounts: AccountStoreRef,
        transactions: TransactionStoreRef,
        events: EventLogRef,
        config: EngineConfig,
    ) -> Self {
        let balances = BalanceUpdater::new(accounts.clone(), config.max_balance_retries);
        Self {
            transfers: TransferService::new(
                accounts.clone(),
                transactions.clone(),
                balances.clone(),
            ),
            reconciliation: ReconciliationService::new(transactions.clone(), events, balances),
            queries: TransactionQueries::new(transactions.clone()),
            accounts,
            transactions,
        }
    }

    /// Provisions an account with an opening balance.
    pub async fn open_account(&self, id: &str, balance: Decimal) -> Result<Account> {
        let account = Account::open(id, Balance::new(balance))?;
        self.accounts.insert(account.clone()).await?;
        Ok(account)
    }

    pub async fn balance(&self, account_id: &str) -> Result<Balance> {
        self.accounts.get_balance(account_id).await
    }

    /// Starts a transfer, deducting `amount` from the payer immediately.
    pub async fn initiate_transfer(
        &self,
        payer_id: &str,
        receiver_id: &str,
        amount: Decimal,
        idempotency_key: &str,
    ) -> Result<TransferReceipt> {
        self.transfers
            .initiate(payer_id, receiver_id, amount, idempotency_key)
            .await
    }

    pub async fn get_transaction(&self, id: &str) -> Result<TransactionRecord> {
        self.queries.get_transaction(id).await
    }

    pub async fn list_transactions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TransactionSummary>> {
        self.queries.list_for_user(user_id).await
    }

    /// Applies one gateway callback to the transaction it names.
    pub async fn reconcile_gateway_callback(
        &self,
        transaction_id: &str,
        reported_status: TransactionStatus,
        reported_amount: Decimal,
        raw_payload: Value,
    ) -> Result<()> {
        self.reconciliation
            .reconcile(transaction_id, reported_status, reported_amount, raw_payload)
            .await
    }

    /// Snapshot of all accounts, ordered by id.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = self.accounts.all().await?;
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    /// Snapshot of all transaction records, oldest first.
    pub async fn transactions(&self) -> Result<Vec<TransactionRecord>> {
        self.transactions.all().await
    }
}
