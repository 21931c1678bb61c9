//! Entity directory: customers and sellers.
//!
//! The ledger resolves counterparty names through this module and can
//! quick-create a counterparty inside its own atomic commit.

pub mod error;
pub mod service;
pub mod types;

pub use error::DirectoryError;
pub use service::DirectoryService;
pub use types::{Counterparty, CounterpartyKind, NewCounterparty};
