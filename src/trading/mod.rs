//! Order, fill and position bookkeeping.
//!
//! This module handles:
//! - Order intents and fill results
//! - Per-market position records and their state machine
//! - The market-keyed position ledger

pub mod ledger;
pub mod order;
pub mod position;

pub use ledger::PositionLedger;
pub use order::{Direction, FillResult, FillStatus, OrderIntent};
pub use position::{ApplyOutcome, Position, PositionState, UnwindRecord};
