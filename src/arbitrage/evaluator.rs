//! Opportunity evaluation: admission and sizing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::error::SkipReason;
use crate::market::Market;
use crate::orderbook::BookLevel;
use crate::trading::Position;

/// A profitable, sizeable, admissible trade computed from the current
/// top-of-book. Ephemeral: consumed by one execution cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    /// Market the opportunity was computed for.
    pub market_id: String,
    /// YES limit price: touch plus slippage buffer.
    pub yes_price: Decimal,
    /// NO limit price: touch plus slippage buffer.
    pub no_price: Decimal,
    /// Whole shares to buy on each leg.
    pub shares: u64,
    /// Sum of the two touch prices, before buffers.
    pub combined_raw: Decimal,
}

impl Opportunity {
    /// Sum of both buffered limit prices.
    pub fn combined_buffered(&self) -> Decimal {
        self.yes_price + self.no_price
    }

    /// Worst-case capital this pair consumes if both legs fill at limit.
    pub fn max_outlay(&self) -> Decimal {
        self.combined_buffered() * Decimal::from(self.shares)
    }

    /// Locked-in profit per pair at the raw touch prices.
    pub fn raw_edge_per_pair(&self) -> Decimal {
        Decimal::ONE - self.combined_raw
    }
}

/// Result of evaluating one book update for a market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A trade should be attempted.
    Admit(Opportunity),
    /// No trade this cycle; normal flow control.
    Skip(SkipReason),
}

/// Evaluate the current top-of-book against position and limits.
///
/// Pure given its inputs: no side effects and no ordering dependency beyond
/// reading the latest ledger snapshot. The decision sequence follows the
/// admission pipeline: price ceiling, capital capacity, pair sizing,
/// per-leg minimum notional.
pub fn evaluate(
    market: &Market,
    best_yes: Option<BookLevel>,
    best_no: Option<BookLevel>,
    position: &Position,
    config: &EngineConfig,
) -> Decision {
    let Some(yes) = best_yes else {
        return Decision::Skip(SkipReason::NoLiquidity {
            token_id: market.yes_token_id.clone(),
        });
    };
    let Some(no) = best_no else {
        return Decision::Skip(SkipReason::NoLiquidity {
            token_id: market.no_token_id.clone(),
        });
    };

    let buffer = config.slippage_buffer;
    let combined_raw = yes.price + no.price;
    let combined_buffered = combined_raw + buffer * Decimal::TWO;

    if combined_buffered >= config.max_combined_price {
        return Decision::Skip(SkipReason::PriceAboveCeiling {
            combined_buffered,
            ceiling: config.max_combined_price,
        });
    }

    let remaining_capacity = config.max_position_usd - position.total_cost();
    if remaining_capacity <= Decimal::ZERO {
        return Decision::Skip(SkipReason::PositionLimitReached {
            spent: position.total_cost(),
            limit: config.max_position_usd,
        });
    }

    // Equal shares on both legs, so capacity is measured in pairs.
    let cost_per_pair = combined_raw;
    let max_pairs_by_capacity = remaining_capacity / cost_per_pair;
    let max_pairs_by_order_limit = config.max_order_usd * Decimal::TWO / cost_per_pair;

    let shares = max_pairs_by_capacity
        .min(max_pairs_by_order_limit)
        .floor()
        .to_u64()
        .unwrap_or(0);

    let yes_price = yes.price + buffer;
    let no_price = no.price + buffer;
    let yes_notional = yes_price * Decimal::from(shares);
    let no_notional = no_price * Decimal::from(shares);

    if shares == 0 || yes_notional < config.min_order_usd || no_notional < config.min_order_usd {
        return Decision::Skip(SkipReason::BelowMinOrder {
            yes_notional,
            no_notional,
            minimum: config.min_order_usd,
        });
    }

    Decision::Admit(Opportunity {
        market_id: market.id.clone(),
        yes_price,
        no_price,
        shares,
        combined_raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Resolution;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn test_market() -> Market {
        Market {
            id: "mkt-1".to_string(),
            yes_token_id: "yes-token".to_string(),
            no_token_id: "no-token".to_string(),
            start_timestamp: 0,
            resolution_deadline: 900,
            resolution: Resolution::Pending,
        }
    }

    fn level(price: Decimal) -> Option<BookLevel> {
        Some(BookLevel::new(price, dec!(1000)))
    }

    fn empty_position() -> Position {
        Position::new("mkt-1")
    }

    #[test]
    fn buffered_price_at_ceiling_is_rejected() {
        // 0.44 + 0.50 + 2*0.02 = 0.98 >= 0.97
        let decision = evaluate(
            &test_market(),
            level(dec!(0.44)),
            level(dec!(0.50)),
            &empty_position(),
            &EngineConfig::default(),
        );

        assert_eq!(
            decision,
            Decision::Skip(SkipReason::PriceAboveCeiling {
                combined_buffered: dec!(0.98),
                ceiling: dec!(0.97),
            })
        );
    }

    #[test]
    fn admitted_opportunity_sizes_to_order_limit() {
        // combined_raw = 0.90, buffered 0.94 < 0.97.
        // capacity: 100/0.90 = 111.1 pairs; order limit: 50/0.90 = 55.5.
        let decision = evaluate(
            &test_market(),
            level(dec!(0.40)),
            level(dec!(0.50)),
            &empty_position(),
            &EngineConfig::default(),
        );

        let Decision::Admit(opportunity) = decision else {
            panic!("expected admission, got {decision:?}");
        };
        assert_eq!(opportunity.shares, 55);
        assert_eq!(opportunity.yes_price, dec!(0.42));
        assert_eq!(opportunity.no_price, dec!(0.52));
        assert_eq!(opportunity.combined_raw, dec!(0.90));
        assert_eq!(opportunity.raw_edge_per_pair(), dec!(0.10));
    }

    #[test]
    fn admitted_opportunity_sizes_to_remaining_capacity() {
        let mut position = empty_position();
        let fill = crate::trading::FillResult {
            intent_id: "seed".to_string(),
            filled_quantity: dec!(80),
            avg_price: dec!(0.90),
            status: crate::trading::FillStatus::Filled,
            order_id: None,
        };
        position
            .apply(crate::market::Outcome::Yes, &fill, time::OffsetDateTime::UNIX_EPOCH)
            .unwrap();
        // $72 spent, $28 remaining: 28/0.90 = 31.1 pairs < order limit 55.5.

        let decision = evaluate(
            &test_market(),
            level(dec!(0.40)),
            level(dec!(0.50)),
            &position,
            &EngineConfig::default(),
        );

        let Decision::Admit(opportunity) = decision else {
            panic!("expected admission, got {decision:?}");
        };
        assert_eq!(opportunity.shares, 31);
    }

    #[test]
    fn missing_ladder_skips_with_no_liquidity() {
        let decision = evaluate(
            &test_market(),
            None,
            level(dec!(0.50)),
            &empty_position(),
            &EngineConfig::default(),
        );

        assert_eq!(
            decision,
            Decision::Skip(SkipReason::NoLiquidity {
                token_id: "yes-token".to_string(),
            })
        );
    }

    #[test]
    fn exhausted_capacity_skips_with_position_limit() {
        let mut position = empty_position();
        let fill = crate::trading::FillResult {
            intent_id: "seed".to_string(),
            filled_quantity: dec!(200),
            avg_price: dec!(0.50),
            status: crate::trading::FillStatus::Filled,
            order_id: None,
        };
        position
            .apply(crate::market::Outcome::Yes, &fill, time::OffsetDateTime::UNIX_EPOCH)
            .unwrap();

        let decision = evaluate(
            &test_market(),
            level(dec!(0.40)),
            level(dec!(0.50)),
            &position,
            &EngineConfig::default(),
        );

        assert_eq!(
            decision,
            Decision::Skip(SkipReason::PositionLimitReached {
                spent: dec!(100),
                limit: dec!(100),
            })
        );
    }

    #[test]
    fn tiny_order_skips_below_minimum() {
        let config = EngineConfig {
            max_order_usd: dec!(2),
            ..EngineConfig::default()
        };
        // Order limit allows 4/0.90 = 4.4 pairs -> 4 shares;
        // YES notional 4 * 0.42 = 1.68 < $5 minimum.
        let decision = evaluate(
            &test_market(),
            level(dec!(0.40)),
            level(dec!(0.50)),
            &empty_position(),
            &config,
        );

        assert_eq!(
            decision,
            Decision::Skip(SkipReason::BelowMinOrder {
                yes_notional: dec!(1.68),
                no_notional: dec!(2.08),
                minimum: dec!(5),
            })
        );
    }

    #[test]
    fn capacity_too_small_for_one_pair_skips() {
        let config = EngineConfig {
            max_position_usd: dec!(0.50),
            ..EngineConfig::default()
        };
        let decision = evaluate(
            &test_market(),
            level(dec!(0.40)),
            level(dec!(0.50)),
            &empty_position(),
            &config,
        );

        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::BelowMinOrder { .. })
        ));
    }

    #[test]
    fn admitted_shares_always_clear_invariants() {
        let config = EngineConfig::default();
        let decision = evaluate(
            &test_market(),
            level(dec!(0.45)),
            level(dec!(0.46)),
            &empty_position(),
            &config,
        );

        let Decision::Admit(opportunity) = decision else {
            panic!("expected admission, got {decision:?}");
        };
        let buffer_pair = config.slippage_buffer * Decimal::TWO;
        assert!(opportunity.combined_raw + buffer_pair < config.max_combined_price);
        let shares = Decimal::from(opportunity.shares);
        assert!(shares * opportunity.yes_price >= config.min_order_usd);
        assert!(shares * opportunity.no_price >= config.min_order_usd);
    }
}
