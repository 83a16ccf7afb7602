//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `PaymentEngine`, the entry point for initiating
//! transfers, reconciling gateway callbacks and reading transactions. The
//! services behind it are stateless; consistency under concurrent requests
//! comes from conditional writes on the stores.

mod balances;
pub mod engine;
pub mod queries;
pub mod reconciliation;
pub mod transfer;

pub use balances::BalanceUpdater;
