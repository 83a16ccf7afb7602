//! Balance arithmetic.
//!
//! Pure functions over a balance and an amount. Every balance change in the
//! engine is one of these calls followed by a store write.

use super::account::Balance;
use crate::error::PaymentError;
use rust_decimal::Decimal;

fn ensure_positive(amount: Decimal) -> Result<(), PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::InvalidAmount);
    }
    Ok(())
}

pub fn has_enough_funds(balance: Balance, amount: Decimal) -> Result<bool, PaymentError> {
    ensure_positive(amount)?;
    Ok(balance.value() >= amount)
}

pub fn deduct(balance: Balance, amount: Decimal) -> Result<Balance, PaymentError> {
    ensure_positive(amount)?;
    if balance.value() < amount {
        return Err(PaymentError::InsufficientFunds);
    }
    balance
        .value()
        .checked_sub(amount)
        .map(Balance::new)
        .ok_or(PaymentError::BalanceOverflow)
}

pub fn credit(balance: Balance, amount: Decimal) -> Result<Balance, PaymentError> {
    ensure_positive(amount)?;
    balance
        .value()
        .checked_add(amount)
        .map(Balance::new)
        .ok_or(PaymentError::BalanceOverflow)
}
