use super::balances::BalanceUpdater;
use crate::domain::event::ReconciliationEvent;
use crate::domain::ports::{EventLogRef, TransactionStoreRef};
use crate::domain::transaction::{TransactionRecord, TransactionStatus};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

/// Applies payment-gateway callbacks to pending transfers.
///
/// Callbacks are delivered at least once. The first valid callback for a
/// transaction claims the terminal status with a conditional write and is
/// the only one allowed to touch balances; every later delivery fails with
/// `AlreadyFinalized`. If the balance update then fails, the claim is
/// released so a redelivery can settle the transaction. Each attempt,
/// successful or not, is appended to the event log.
#[derive(Clone)]
pub struct ReconciliationService {
    transactions: TransactionStoreRef,
    events: EventLogRef,
    balances: BalanceUpdater,
}

impl ReconciliationService {
    pub fn new(
        transactions: TransactionStoreRef,
        events: EventLogRef,
        balances: BalanceUpdater,
    ) -> Self {
        Self {
            transactions,
            events,
            balances,
        }
    }

    #[instrument(skip(self, raw_payload))]
    pub async fn reconcile(
        &self,
        transaction_id: &str,
        reported_status: TransactionStatus,
        reported_amount: Decimal,
        raw_payload: Value,
    ) -> Result<()> {
        match self
            .apply(transaction_id, reported_status, reported_amount)
            .await
        {
            Ok(status) => {
                self.log_event(ReconciliationEvent::applied(raw_payload, status))
                    .await;
                info!(%status, "gateway callback applied");
                Ok(())
            }
            Err(e) => {
                let message = format!("{}: {}", e.error_code(), e);
                self.log_event(ReconciliationEvent::rejected(raw_payload, message))
                    .await;
                if e.is_domain() {
                    warn!(code = e.error_code(), error = %e, "gateway callback rejected");
                    Err(e)
                } else {
                    error!(error = %e, "gateway callback failed");
                    Err(PaymentError::ReconciliationFailed)
                }
            }
        }
    }

    async fn apply(
        &self,
        transaction_id: &str,
        reported_status: TransactionStatus,
        reported_amount: Decimal,
    ) -> Result<TransactionStatus> {
        let mut record = self
            .transactions
            .get(transaction_id)
            .await?
            .ok_or_else(|| PaymentError::TransactionNotFound(transaction_id.to_string()))?;

        if record.amount.value() != reported_amount {
            return Err(PaymentError::AmountMismatch {
                stored: record.amount.value(),
                reported: reported_amount,
            });
        }

        let pending = record.clone();
        record.transition(reported_status)?;

        // Claim the transition; a concurrent delivery of the same callback
        // loses here and never reaches the balance update below.
        if !self
            .transactions
            .update_if_status(&record, TransactionStatus::Pending)
            .await?
        {
            let current = self
                .transactions
                .get(transaction_id)
                .await?
                .map(|stored| stored.status())
                .unwrap_or(reported_status);
            return Err(PaymentError::AlreadyFinalized(current));
        }

        if pending.is_amount_deducted() {
            if let Err(e) = self.settle(&mut record).await {
                self.release(&pending, record.status()).await;
                return Err(e);
            }
            self.transactions.update(&record).await?;
        }

        Ok(record.status())
    }

    /// Moves the deducted amount to the receiver, or back to the payer.
    async fn settle(&self, record: &mut TransactionRecord) -> Result<()> {
        let amount = record.amount.value();
        if record.status() == TransactionStatus::Approved {
            self.balances.credit(&record.receiver_id, amount).await?;
        } else {
            self.balances.credit(&record.payer_id, amount).await?;
            record.mark_refunded();
        }
        Ok(())
    }

    /// Hands a claimed transaction back to `Pending` after its settlement
    /// failed, so a redelivered callback can apply it.
    async fn release(&self, pending: &TransactionRecord, claimed: TransactionStatus) {
        match self.transactions.update_if_status(pending, claimed).await {
            Ok(true) => warn!(
                transaction_id = %pending.id,
                status = %claimed,
                "balance settlement failed, transaction returned to pending"
            ),
            Ok(false) => error!(
                transaction_id = %pending.id,
                status = %claimed,
                "transaction changed while settling, could not return it to pending"
            ),
            Err(e) => error!(
                transaction_id = %pending.id,
                status = %claimed,
                error = %e,
                "balance settlement failed and transaction could not be returned to pending"
            ),
        }
    }

    async fn log_event(&self, event: ReconciliationEvent) {
        if let Err(e) = self.events.append(event).await {
            warn!(error = %e, "failed to append reconciliation event");
        }
    }
}
