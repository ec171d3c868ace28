//! Cash Register Ledger: register sessions and the cash-movement log.
//!
//! A [`CashSession`] is an event-sourced document (open/close). Cash movements
//! are a separate append-only log; a session's expected balance is its opening
//! balance plus the movements recorded against it.

pub mod movement;
pub mod session;

pub use movement::{CashCategory, CashDirection, CashMovement, CashMovementRequest, SessionTotals};
pub use session::{CashSession, SessionCommand, SessionEvent, SessionId, SessionStatus, SessionSummary};
