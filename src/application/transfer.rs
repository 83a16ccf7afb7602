use super::balances::BalanceUpdater;
use crate::domain::account::Amount;
use crate::domain::ports::{AccountStoreRef, TransactionStoreRef};
use crate::domain::transaction::{TransactionRecord, TransferReceipt};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Creates transfers.
///
/// The payer is charged up front: by the time a transaction record exists,
/// its amount has already left the payer's balance. Gateway confirmation
/// later decides whether the receiver is credited or the payer refunded.
#[derive(Clone)]
pub struct TransferService {
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
    balances: BalanceUpdater,
}

impl TransferService {
    pub fn new(
        accounts: AccountStoreRef,
        transactions: TransactionStoreRef,
        balances: BalanceUpdater,
    ) -> Self {
        Self {
            accounts,
            transactions,
            balances,
        }
    }

    #[instrument(skip(self))]
    pub async fn initiate(
        &self,
        payer_id: &str,
        receiver_id: &str,
        amount: Decimal,
        idempotency_key: &str,
    ) -> Result<TransferReceipt> {
        let result = self
            .try_initiate(payer_id, receiver_id, amount, idempotency_key)
            .await;
        match &result {
            Ok(receipt) => info!(
                transaction_id = %receipt.transaction_id,
                "transfer initiated"
            ),
            Err(e) => warn!(code = e.error_code(), error = %e, "transfer rejected"),
        }
        result
    }

    async fn try_initiate(
        &self,
        payer_id: &str,
        receiver_id: &str,
        amount: Decimal,
        idempotency_key: &str,
    ) -> Result<TransferReceipt> {
        let amount = Amount::new(amount)?;

        if payer_id == receiver_id {
            return Err(PaymentError::SameParty);
        }

        if idempotency_key.is_empty() || idempotency_key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN
        {
            return Err(PaymentError::InvalidIdempotencyKey);
        }

        if self
            .transactions
            .exists_idempotency_key(idempotency_key)
            .await?
        {
            return Err(PaymentError::DuplicateRequest(idempotency_key.to_string()));
        }

        for id in [payer_id, receiver_id] {
            if self.accounts.get(id).await?.is_none() {
                return Err(PaymentError::AccountNotFound(id.to_string()));
            }
        }

        self.balances.deduct(payer_id, amount.value()).await?;

        let record = TransactionRecord::new(payer_id, receiver_id, amount, idempotency_key);
        let receipt = TransferReceipt::from(&record);

        // A concurrent request may have claimed the key since the check above;
        // give the payer their money back so nothing of this attempt survives.
        if let Err(e) = self.transactions.create(record).await {
            if let Err(undo) = self.balances.restore(payer_id, amount.value()).await {
                error!(
                    payer_id,
                    %amount,
                    error = %undo,
                    "failed to restore payer balance after aborted transfer"
                );
            }
            return Err(e);
        }

        Ok(receipt)
    }
}
