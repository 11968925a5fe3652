//! Error and skip-condition types for the execution engine.
//!
//! The taxonomy is two-tier: [`SkipReason`] covers the normal-flow-control
//! outcomes of an evaluation cycle (logged and counted, never propagated up
//! the stack), while the `*Error` enums cover conditions that genuinely
//! fail an operation.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::Outcome;

/// Reasons an evaluation cycle produces no trade.
///
/// These are expected outcomes of the hot path; callers log them and move
/// on to the next book update.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No ask levels available for a token.
    #[error("no liquidity for token {token_id}")]
    NoLiquidity {
        /// Token with an empty or missing ask ladder.
        token_id: String,
    },

    /// Buffered combined price at or above the admission ceiling.
    #[error("combined price {combined_buffered} >= ceiling {ceiling}")]
    PriceAboveCeiling {
        /// Sum of both touch prices plus both slippage buffers.
        combined_buffered: Decimal,
        /// Configured maximum combined price.
        ceiling: Decimal,
    },

    /// One or both legs would fall below the minimum order notional.
    #[error("order below minimum: YES=${yes_notional} NO=${no_notional} (min=${minimum})")]
    BelowMinOrder {
        /// Notional of the YES leg at the buffered price.
        yes_notional: Decimal,
        /// Notional of the NO leg at the buffered price.
        no_notional: Decimal,
        /// Configured minimum per-leg notional.
        minimum: Decimal,
    },

    /// Position cost has reached the configured capital limit.
    #[error("position cost ${spent} at limit ${limit}")]
    PositionLimitReached {
        /// Capital already committed to the position.
        spent: Decimal,
        /// Configured maximum position size.
        limit: Decimal,
    },

    /// Buying this side would exceed the time-indexed imbalance bound.
    #[error(
        "{side} imbalance rejected: {held} > {opposite} x {max_ratio} at {minutes_from_start}m"
    )]
    ImbalanceRejected {
        /// Side that failed the check.
        side: Outcome,
        /// Shares currently held on that side.
        held: Decimal,
        /// Shares held on the opposite side.
        opposite: Decimal,
        /// Ratio bound for the current time window.
        max_ratio: Decimal,
        /// Minutes elapsed since market start.
        minutes_from_start: Decimal,
    },

    /// Market is inside the pre-resolution trading cutoff.
    #[error("inside trading cutoff: {seconds_to_deadline}s to resolution")]
    TradingCutoff {
        /// Seconds until the resolution deadline.
        seconds_to_deadline: i64,
    },

    /// A previous pair for this market still has legs outstanding.
    #[error("previous pair still outstanding for this market")]
    CycleInFlight,
}

/// Position ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Mutation attempted on a resolved position.
    #[error("position for market {market_id} is resolved; no further mutation permitted")]
    PositionResolved {
        /// Market whose position is terminal.
        market_id: String,
    },

    /// No position exists for the market.
    #[error("no position for market {market_id}")]
    UnknownMarket {
        /// The unknown market id.
        market_id: String,
    },
}

/// Leg submission and reconciliation errors.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A single leg failed to submit or fill.
    #[error("{side} leg submission failed: {reason}")]
    LegSubmissionFailed {
        /// Which leg failed.
        side: Outcome,
        /// Failure detail from the gateway.
        reason: String,
    },

    /// A broken-pair unwind could not be completed.
    ///
    /// High severity: the position is left with a standing imbalance until
    /// a later cycle corrects it.
    #[error("unwind of {shares} {side} shares failed: {reason}")]
    UnwindFailed {
        /// Side that was supposed to be sold back.
        side: Outcome,
        /// Quantity left exposed.
        shares: Decimal,
        /// Failure detail.
        reason: String,
    },

    /// Cancellation of an outstanding intent failed.
    #[error("failed to cancel intent {intent_id}: {reason}")]
    CancelFailed {
        /// Client intent id that could not be cancelled.
        intent_id: String,
        /// Failure detail.
        reason: String,
    },
}

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Execution error.
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn skip_reason_messages_carry_context() {
        let skip = SkipReason::PriceAboveCeiling {
            combined_buffered: dec!(0.98),
            ceiling: dec!(0.97),
        };
        assert_eq!(skip.to_string(), "combined price 0.98 >= ceiling 0.97");

        let skip = SkipReason::TradingCutoff {
            seconds_to_deadline: 12,
        };
        assert!(skip.to_string().contains("12s"));
    }

    #[test]
    fn ledger_error_converts_to_engine_error() {
        let err: EngineError = LedgerError::PositionResolved {
            market_id: "mkt".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Ledger(_)));
    }
}
