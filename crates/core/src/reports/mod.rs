//! Read side of the ledger.
//!
//! Daily listings with tab and search filters, outstanding balances, daily
//! summaries, payment histories, pending change requests and audit trails.
//! Every query applies the same visibility rule: store managers see all
//! sales but only their own purchases.

pub mod error;
pub mod filter;
pub mod service;


pub use error::ReportError;
pub use filter::{EntityTab, EntryFilter, is_visible_to};
pub use service::{DailySummary, LedgerQueryService};
