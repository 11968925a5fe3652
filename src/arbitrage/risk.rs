//! Time-indexed imbalance admission.

use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::error::SkipReason;
use crate::market::Outcome;
use crate::trading::Position;

/// Admission policy bounding how lopsided a position may become.
///
/// The bound loosens right after market start: opening books are thin and
/// one-sided fills are the norm, so the first minute tolerates a wide
/// ratio, the second minute a moderate one, and everything after runs at
/// the configured steady-state bound. Both legs of a prospective pair must
/// pass before execution; the check is against the current ledger state,
/// not the post-trade state.
#[derive(Debug, Clone)]
pub struct RiskGate {
    bootstrap_ratio: Decimal,
    rebalance_ratio: Decimal,
    steady_ratio: Decimal,
    bootstrap_window: Decimal,
    rebalance_window: Decimal,
}

impl RiskGate {
    /// Build a gate from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            bootstrap_ratio: config.bootstrap_imbalance_ratio,
            rebalance_ratio: config.rebalance_imbalance_ratio,
            steady_ratio: config.steady_imbalance_ratio,
            bootstrap_window: config.bootstrap_window_minutes,
            rebalance_window: config.rebalance_window_minutes,
        }
    }

    /// Max ratio for the elapsed time. Window edges belong to the stricter
    /// side: exactly 1.0 minutes is already the rebalancing window.
    pub fn max_ratio(&self, minutes_from_start: Decimal) -> Decimal {
        if minutes_from_start < self.bootstrap_window {
            self.bootstrap_ratio
        } else if minutes_from_start < self.rebalance_window {
            self.rebalance_ratio
        } else {
            self.steady_ratio
        }
    }

    /// Check whether buying `side` is admissible right now.
    ///
    /// Always permits when the opposite side holds nothing: every market
    /// has to be able to bootstrap its first pair.
    pub fn can_buy(
        &self,
        position: &Position,
        side: Outcome,
        minutes_from_start: Decimal,
    ) -> Result<(), SkipReason> {
        let opposite = position.shares(side.opposite());
        if opposite.is_zero() {
            return Ok(());
        }

        let held = position.shares(side);
        let max_ratio = self.max_ratio(minutes_from_start);
        if held <= opposite * max_ratio {
            Ok(())
        } else {
            Err(SkipReason::ImbalanceRejected {
                side,
                held,
                opposite,
                max_ratio,
                minutes_from_start,
            })
        }
    }

    /// Admit a pair: both the YES and the NO buy must pass.
    pub fn admit(&self, position: &Position, minutes_from_start: Decimal) -> Result<(), SkipReason> {
        self.can_buy(position, Outcome::Yes, minutes_from_start)?;
        self.can_buy(position, Outcome::No, minutes_from_start)
    }
}
