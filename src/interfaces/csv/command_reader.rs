use crate::domain::transaction::TransactionStatus;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Provision an account with an opening balance.
    Open,
    /// Initiate a transfer.
    Transfer,
    /// Deliver a payment-gateway callback.
    Callback,
}

/// One row of a command script.
///
/// Columns are `type, account, counterparty, amount, reference, status`;
/// which of them are required depends on the command type.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub r#type: CommandType,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
}

impl Command {
    /// Returns a required column or a validation error naming it.
    pub fn require<'a, T: ?Sized>(&self, value: Option<&'a T>, column: &str) -> Result<&'a T> {
        value.ok_or_else(|| {
            PaymentError::InvalidInput(format!("{:?} command is missing '{column}'", self.r#type))
        })
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
