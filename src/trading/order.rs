//! Order intents and fill results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::market::Outcome;

/// Buy or sell direction of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Buy order.
    #[strum(serialize = "BUY", serialize = "buy")]
    Buy,
    /// Sell order (unwind path only).
    #[strum(serialize = "SELL", serialize = "sell")]
    Sell,
}

/// A single-use order intent, created and consumed within one cycle.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    /// Unique client id; also the idempotency key for fill application.
    pub intent_id: String,
    /// Market this intent trades.
    pub market_id: String,
    /// Which outcome token the intent trades.
    pub side: Outcome,
    /// Token id submitted to the gateway.
    pub token_id: String,
    /// Buy or sell.
    pub direction: Direction,
    /// Limit price.
    pub price: Decimal,
    /// Quantity in shares.
    pub quantity: Decimal,
    /// When the intent was created.
    pub submitted_at: OffsetDateTime,
}

impl OrderIntent {
    /// Validate intent parameters before submission.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_id.is_empty() {
            return Err("token_id is required".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("price must be positive".to_string());
        }
        if self.quantity <= Decimal::ZERO {
            return Err("quantity must be positive".to_string());
        }
        Ok(())
    }

    /// Notional value of the intent at its limit price.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Terminal status of a submitted leg.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum FillStatus {
    /// Fully filled at or better than the limit.
    #[strum(serialize = "filled", serialize = "FILLED")]
    Filled,
    /// Filled for part of the requested quantity.
    #[strum(serialize = "partially_filled", serialize = "PARTIALLY_FILLED")]
    PartiallyFilled,
    /// Nothing filled; the order rested or was cancelled unfilled.
    #[strum(serialize = "unfilled", serialize = "UNFILLED")]
    Unfilled,
    /// Submission itself failed.
    #[strum(serialize = "failed", serialize = "FAILED")]
    Failed,
}

/// Joined outcome of one leg, produced by the gateway.
#[derive(Debug, Clone)]
pub struct FillResult {
    /// Intent this result settles.
    pub intent_id: String,
    /// Quantity actually filled.
    pub filled_quantity: Decimal,
    /// Average fill price over the filled quantity.
    pub avg_price: Decimal,
    /// Terminal status.
    pub status: FillStatus,
    /// Gateway order id, when one was assigned.
    pub order_id: Option<String>,
}

impl FillResult {
    /// A full fill at the given price.
    pub fn filled(intent: &OrderIntent, avg_price: Decimal, order_id: impl Into<String>) -> Self {
        Self {
            intent_id: intent.intent_id.clone(),
            filled_quantity: intent.quantity,
            avg_price,
            status: FillStatus::Filled,
            order_id: Some(order_id.into()),
        }
    }

    /// A partial fill.
    pub fn partial(
        intent: &OrderIntent,
        filled_quantity: Decimal,
        avg_price: Decimal,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: intent.intent_id.clone(),
            filled_quantity,
            avg_price,
            status: FillStatus::PartiallyFilled,
            order_id: Some(order_id.into()),
        }
    }

    /// Nothing filled.
    pub fn unfilled(intent_id: impl Into<String>) -> Self {
        Self {
            intent_id: intent_id.into(),
            filled_quantity: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            status: FillStatus::Unfilled,
            order_id: None,
        }
    }

    /// Submission failure collected into a result.
    pub fn failed(intent_id: impl Into<String>) -> Self {
        Self {
            intent_id: intent_id.into(),
            filled_quantity: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            status: FillStatus::Failed,
            order_id: None,
        }
    }

    /// Whether this leg put shares on the book: filled or partially filled
    /// with a positive quantity.
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            FillStatus::Filled | FillStatus::PartiallyFilled
        ) && self.filled_quantity > Decimal::ZERO
    }

    /// Capital consumed by this fill.
    pub fn cost(&self) -> Decimal {
        self.filled_quantity * self.avg_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_intent() -> OrderIntent {
        OrderIntent {
            intent_id: "mkt-1-yes".to_string(),
            market_id: "mkt".to_string(),
            side: Outcome::Yes,
            token_id: "yes-token".to_string(),
            direction: Direction::Buy,
            price: dec!(0.42),
            quantity: dec!(20),
            submitted_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn intent_validation() {
        assert!(test_intent().validate().is_ok());

        let mut no_token = test_intent();
        no_token.token_id = String::new();
        assert!(no_token.validate().is_err());

        let mut zero_price = test_intent();
        zero_price.price = Decimal::ZERO;
        assert!(zero_price.validate().is_err());

        let mut zero_qty = test_intent();
        zero_qty.quantity = Decimal::ZERO;
        assert!(zero_qty.validate().is_err());
    }

    #[test]
    fn intent_notional() {
        assert_eq!(test_intent().notional(), dec!(8.4));
    }

    #[test]
    fn fill_success_classification() {
        let intent = test_intent();

        assert!(FillResult::filled(&intent, dec!(0.42), "ord-1").is_success());
        assert!(FillResult::partial(&intent, dec!(5), dec!(0.42), "ord-2").is_success());
        assert!(!FillResult::unfilled("i").is_success());
        assert!(!FillResult::failed("i").is_success());

        // A "partial" fill of zero shares is not a success.
        let hollow = FillResult {
            intent_id: "i".to_string(),
            filled_quantity: Decimal::ZERO,
            avg_price: dec!(0.42),
            status: FillStatus::PartiallyFilled,
            order_id: None,
        };
        assert!(!hollow.is_success());
    }

    #[test]
    fn fill_cost() {
        let intent = test_intent();
        let fill = FillResult::filled(&intent, dec!(0.42), "ord-1");
        assert_eq!(fill.cost(), dec!(8.4));
    }
}
