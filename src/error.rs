use crate::domain::transaction::TransactionStatus;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Semantic class of a failure, used by boundaries to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Transaction amount must be positive")]
    InvalidAmount,
    #[error("Payer and receiver must be different accounts")]
    SameParty,
    #[error("Idempotency key must be between 1 and 255 characters")]
    InvalidIdempotencyKey,
    #[error("Reported amount {reported} does not match the transaction amount {stored}")]
    AmountMismatch { stored: Decimal, reported: Decimal },
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account {0} not found")]
    AccountNotFound(String),
    #[error("Transaction {0} not found")]
    TransactionNotFound(String),

    #[error("Idempotency key '{0}' has already been used")]
    DuplicateRequest(String),
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Transaction already finalized as '{0}' and cannot be changed")]
    AlreadyFinalized(TransactionStatus),
    #[error("Invalid status transition to '{0}'")]
    InvalidTransition(TransactionStatus),
    #[error("Account {0} already exists")]
    AccountExists(String),
    #[error("Balance would exceed the largest representable amount")]
    BalanceOverflow,
    #[error("Balance of account {0} kept changing, giving up")]
    BalanceContention(String),

    #[error("Failed to process the gateway callback")]
    ReconciliationFailed,
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        use PaymentError::*;
        match self {
            InvalidAmount
            | SameParty
            | InvalidIdempotencyKey
            | AmountMismatch { .. }
            | InvalidAccount(_)
            | InvalidInput(_) => ErrorKind::InvalidRequest,
            AccountNotFound(_) | TransactionNotFound(_) => ErrorKind::NotFound,
            DuplicateRequest(_)
            | InsufficientFunds
            | AlreadyFinalized(_)
            | InvalidTransition(_)
            | AccountExists(_)
            | BalanceOverflow
            | BalanceContention(_) => ErrorKind::Conflict,
            _ => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn error_code(&self) -> &'static str {
        use PaymentError::*;
        match self {
            InvalidAmount => "INVALID_AMOUNT",
            SameParty => "SAME_PARTY",
            InvalidIdempotencyKey => "INVALID_IDEMPOTENCY_KEY",
            AmountMismatch { .. } => "AMOUNT_MISMATCH",
            InvalidAccount(_) => "INVALID_ACCOUNT",
            InvalidInput(_) => "INVALID_INPUT",
            AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            DuplicateRequest(_) => "DUPLICATE_REQUEST",
            InsufficientFunds => "INSUFFICIENT_FUNDS",
            AlreadyFinalized(_) => "ALREADY_FINALIZED",
            InvalidTransition(_) => "INVALID_TRANSITION",
            AccountExists(_) => "ACCOUNT_EXISTS",
            BalanceOverflow => "BALANCE_OVERFLOW",
            BalanceContention(_) => "BALANCE_CONTENTION",
            ReconciliationFailed => "RECONCILIATION_FAILED",
            _ => "INTERNAL_ERROR",
        }
    }

    /// HTTP-equivalent status for the error class.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    pub fn is_domain(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        PaymentError::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}
