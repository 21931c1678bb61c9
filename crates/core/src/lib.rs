//! Core business logic for Khata.
//!
//! This crate holds the domain of a small-business billing ledger with no web
//! dependencies. Persistence sits behind the [`store::LedgerStore`] port; an
//! in-memory implementation ships here and the Postgres one lives in
//! `khata-db`.
//!
//! # Modules
//!
//! - `ledger` - Sale and purchase entries, totals, payment settlement, reversal
//! - `workflow` - Change requests and admin approval
//! - `reports` - Daily listings, summaries and histories
//! - `payments` - Payment records and allocation of received money
//! - `catalog` - Products and stock arithmetic
//! - `directory` - Customers and sellers
//! - `store` - Versioned document store and optimistic transactions

pub mod actor;
pub mod audit;
pub mod catalog;
pub mod directory;
pub mod ledger;
pub mod notify;
pub mod payments;
pub mod reports;
pub mod store;
pub mod workflow;

pub use actor::{ActorContext, ActorRole};
