//! Domain layer: entities, value objects, balance arithmetic and the
//! collaborator ports the application layer is written against.

pub mod account;
pub mod balance;
pub mod event;
pub mod ports;
pub mod transaction;
