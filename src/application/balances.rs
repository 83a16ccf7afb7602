use crate::domain::account::Balance;
use crate::domain::balance;
use crate::domain::ports::AccountStoreRef;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use tracing::debug;

/// Applies balance arithmetic to stored accounts with optimistic concurrency.
///
/// Each change reads the balance, computes the new value and writes it back
/// with a compare-and-set. A lost race re-reads and tries again, up to
/// `max_retries` times for ordinary changes and without limit for
/// [`Self::restore`].
#[derive(Clone)]
pub struct BalanceUpdater {
    accounts: AccountStoreRef,
    max_retries: u32,
}

impl BalanceUpdater {
    pub fn new(accounts: AccountStoreRef, max_retries: u32) -> Self {
        Self {
            accounts,
            max_retries,
        }
    }

    /// Takes `amount` from the account after checking it can cover it.
    pub async fn deduct(&self, account_id: &str, amount: Decimal) -> Result<Balance> {
        self.apply(account_id, Some(self.max_retries), |current| {
            if !balance::has_enough_funds(current, amount)? {
                return Err(PaymentError::InsufficientFunds);
            }
            balance::deduct(current, amount)
        })
        .await
    }

    pub async fn credit(&self, account_id: &str, amount: Decimal) -> Result<Balance> {
        self.apply(account_id, Some(self.max_retries), |current| {
            balance::credit(current, amount)
        })
        .await
    }

    /// Gives back an amount this engine deducted earlier.
    ///
    /// Lost races are retried without limit: a credit never fails for lack
    /// of funds, so only a store error or an overflow can stop it.
    pub async fn restore(&self, account_id: &str, amount: Decimal) -> Result<Balance> {
        self.apply(account_id, None, |current| balance::credit(current, amount))
            .await
    }

    async fn apply<F>(&self, account_id: &str, max_retries: Option<u32>, op: F) -> Result<Balance>
    where
        F: Fn(Balance) -> Result<Balance> + Send + Sync,
    {
        let mut attempt: u32 = 0;
        loop {
            let current = self.accounts.get_balance(account_id).await?;
            let next = op(current)?;
            if self
                .accounts
                .compare_and_set_balance(account_id, current, next)
                .await?
            {
                return Ok(next);
            }
            if max_retries.is_some_and(|max| attempt >= max) {
                return Err(PaymentError::BalanceContention(account_id.to_string()));
            }
            debug!(account_id, attempt, "balance changed concurrently, retrying");
            attempt = attempt.saturating_add(1);
            tokio::task::yield_now().await;
        }
    }
}
