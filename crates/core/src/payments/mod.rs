//! Payment records and settlement allocation.
//!
//! Records are written only by the ledger engine, in the same commit as the
//! ledger entry they belong to.

pub mod allocation;
pub mod types;

#[cfg(test)]
mod allocation_props;

pub use allocation::{Allocation, OutstandingBalance, allocate};
pub use types::{PaymentApplication, PaymentRecord, PaymentRecordStatus, PaymentRecordType};
