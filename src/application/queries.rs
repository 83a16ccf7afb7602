use crate::domain::ports::TransactionStoreRef;
use crate::domain::transaction::{TransactionRecord, TransactionSummary};
use crate::error::{PaymentError, Result};

/// Read-only lookups over transaction records.
#[derive(Clone)]
pub struct TransactionQueries {
    transactions: TransactionStoreRef,
}

impl TransactionQueries {
    pub fn new(transactions: TransactionStoreRef) -> Self {
        Self { transactions }
    }

    pub async fn get_transaction(&self, id: &str) -> Result<TransactionRecord> {
        self.transactions
            .get(id)
            .await?
            .ok_or_else(|| PaymentError::TransactionNotFound(id.to_string()))
    }

    /// Every transaction the user sent or received, tagged with its direction.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<TransactionSummary>> {
        let records = self.transactions.list_by_party(user_id).await?;
        Ok(records
            .iter()
            .map(|record| TransactionSummary::for_user(record, user_id))
            .collect())
    }
}
