//! Accounting module (double-entry general ledger).
//!
//! Pure domain logic only: no IO, no persistence concerns. The engine turns
//! completed business events into balanced [`Posting`]s through the
//! [`PostingGenerator`] and appends them as immutable [`AccountingEntry`] rows.

pub mod balance;
pub mod chart;
pub mod entry;
pub mod posting;

pub use balance::{TrialBalance, TrialBalanceRow};
pub use chart::{AccountCode, ChartOfAccounts, ExpenseAccounts, ExpenseCategory};
pub use entry::{AccountingEntry, JournalLine};
pub use posting::{BusinessEvent, Posting, PostingGenerator, validate_balanced};
