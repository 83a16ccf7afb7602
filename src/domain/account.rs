use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents an account balance.
///
/// This is a wrapper around `rust_decimal::Decimal`. Balances only change
/// through the functions in [`crate::domain::balance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// Represents a strictly positive monetary amount for transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// An account holding a single-currency balance.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    /// Opaque account identifier.
    pub id: String,
    /// Current balance, never negative at rest.
    pub balance: Balance,
}

impl Account {
    /// Builds an account with an opening balance.
    ///
    /// Accounts are provisioned outside the transfer flow; this only checks
    /// that the id is usable and the opening balance is not negative.
    pub fn open(id: impl Into<String>, balance: Balance) -> Result<Self, PaymentError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PaymentError::InvalidAccount(
                "account id must not be empty".to_string(),
            ));
        }
        if balance.is_negative() {
            return Err(PaymentError::InvalidAccount(format!(
                "opening balance of {id} must not be negative"
            )));
        }
        Ok(Self { id, balance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(PaymentError::InvalidAmount)
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(PaymentError::InvalidAmount)
        ));
    }

    #[test]
    fn test_amount_deserialization_rejects_non_positive() {
        let ok: Amount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(ok.value(), dec!(12.5));
        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
    }

    #[test]
    fn test_balance_display_is_normalized() {
        assert_eq!(Balance::new(dec!(60.00)).to_string(), "60");
        assert_eq!(Balance::new(dec!(0.0002)).to_string(), "0.0002");
    }

    #[test]
    fn test_account_open() {
        let account = Account::open("alice", Balance::new(dec!(100))).unwrap();
        assert_eq!(account.id, "alice");
        assert_eq!(account.balance, Balance::new(dec!(100)));
    }

    #[test]
    fn test_account_open_rejects_bad_input() {
        assert!(matches!(
            Account::open(" ", Balance::ZERO),
            Err(PaymentError::InvalidAccount(_))
        ));
        assert!(matches!(
            Account::open("bob", Balance::new(dec!(-0.01))),
            Err(PaymentError::InvalidAccount(_))
        ));
    }
}
