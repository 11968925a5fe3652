//! Dual-leg execution and fill reconciliation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::evaluator::Opportunity;
use crate::config::EngineConfig;
use crate::error::{EngineError, ExecutionError};
use crate::gateway::OrderGateway;
use crate::market::{Market, Outcome};
use crate::metrics;
use crate::orderbook::OrderBookCache;
use crate::telemetry::{TelemetrySink, TradeEvent};
use crate::trading::{Direction, FillResult, FillStatus, OrderIntent, PositionLedger};

/// Joined outcome of one execution cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Both legs filled; the pair is on the books.
    PairCompleted {
        /// YES shares filled.
        yes_filled: Decimal,
        /// NO shares filled.
        no_filled: Decimal,
        /// Capital consumed by both fills.
        cost: Decimal,
    },
    /// Exactly one leg filled; an unwind was attempted.
    BrokenPair {
        /// The leg that filled.
        filled_side: Outcome,
        /// Shares filled on that leg.
        filled_quantity: Decimal,
        /// Whether the unwind sell succeeded.
        unwound: bool,
        /// The unwind failure, when one occurred. The imbalance stands
        /// until a later cycle corrects it.
        unwind_error: Option<ExecutionError>,
    },
    /// Neither leg filled; no ledger mutation.
    NothingFilled,
}

/// Submits both legs of an admitted opportunity concurrently and
/// reconciles the joined outcomes into the ledger.
///
/// The coordinator is the single writer of position state. Per-market cycle
/// exclusivity is enforced by the engine; within a cycle the two legs run
/// unordered and are only interpreted once both results are known.
pub struct ExecutionCoordinator {
    gateway: Arc<dyn OrderGateway>,
    ledger: Arc<PositionLedger>,
    books: Arc<OrderBookCache>,
    telemetry: Arc<dyn TelemetrySink>,
    submission_timeout: Duration,
    intent_seq: AtomicU64,
}

impl ExecutionCoordinator {
    /// Create a coordinator over the shared engine state.
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        ledger: Arc<PositionLedger>,
        books: Arc<OrderBookCache>,
        telemetry: Arc<dyn TelemetrySink>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            gateway,
            ledger,
            books,
            telemetry,
            submission_timeout: config.submission_timeout(),
            intent_seq: AtomicU64::new(0),
        }
    }

    /// Execute an admitted opportunity: submit both legs, join, reconcile.
    #[instrument(skip(self, market, opportunity), fields(market = %market.id, shares = opportunity.shares))]
    pub async fn execute(
        &self,
        market: &Market,
        opportunity: &Opportunity,
    ) -> Result<CycleOutcome, EngineError> {
        let quantity = Decimal::from(opportunity.shares);
        let yes_intent =
            self.build_intent(market, Outcome::Yes, Direction::Buy, opportunity.yes_price, quantity);
        let no_intent =
            self.build_intent(market, Outcome::No, Direction::Buy, opportunity.no_price, quantity);

        info!(
            yes_price = %opportunity.yes_price,
            no_price = %opportunity.no_price,
            combined_raw = %opportunity.combined_raw,
            "Submitting paired legs"
        );

        let settle_start = Instant::now();
        let (yes_result, no_result) = tokio::join!(
            self.submit_leg(&yes_intent),
            self.submit_leg(&no_intent),
        );
        metrics::record_pair_settle_latency(settle_start);

        // Reconciliation branches on the joined pair, never a single leg.
        match (yes_result.is_success(), no_result.is_success()) {
            (true, true) => {
                self.apply_fill(market, Outcome::Yes, &yes_result)?;
                self.apply_fill(market, Outcome::No, &no_result)?;
                metrics::inc_pairs_completed();

                let cost = yes_result.cost() + no_result.cost();
                info!(
                    yes_filled = %yes_result.filled_quantity,
                    no_filled = %no_result.filled_quantity,
                    cost = %cost,
                    "Pair complete"
                );
                Ok(CycleOutcome::PairCompleted {
                    yes_filled: yes_result.filled_quantity,
                    no_filled: no_result.filled_quantity,
                    cost,
                })
            }
            (true, false) => self.reconcile_broken_pair(market, Outcome::Yes, &yes_result).await,
            (false, true) => self.reconcile_broken_pair(market, Outcome::No, &no_result).await,
            (false, false) => {
                info!("Neither leg filled; no ledger mutation");
                Ok(CycleOutcome::NothingFilled)
            }
        }
    }

    /// Submit one leg, bounding the wait with the configured timeout.
    ///
    /// A timed-out leg gets a best-effort cancel and is reported unfilled;
    /// gateway errors arrive as `Failed` results from the seam itself.
    async fn submit_leg(&self, intent: &OrderIntent) -> FillResult {
        metrics::inc_legs_submitted();

        let result =
            match tokio::time::timeout(self.submission_timeout, self.gateway.submit(intent)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        intent = %intent.intent_id,
                        timeout_ms = self.submission_timeout.as_millis() as u64,
                        "Leg submission timed out; cancelling"
                    );
                    if let Err(e) = self.gateway.cancel(&intent.intent_id).await {
                        warn!(intent = %intent.intent_id, error = %e, "Cancel after timeout failed");
                    }
                    FillResult::unfilled(intent.intent_id.clone())
                }
            };

        match result.status {
            FillStatus::Failed => metrics::inc_legs_failed(),
            _ if result.is_success() => metrics::inc_legs_filled(),
            _ => {}
        }
        result
    }

    /// Apply the surviving leg of a broken pair, then try to unwind it.
    async fn reconcile_broken_pair(
        &self,
        market: &Market,
        filled_side: Outcome,
        fill: &FillResult,
    ) -> Result<CycleOutcome, EngineError> {
        warn!(
            side = %filled_side,
            filled = %fill.filled_quantity,
            "Broken pair: one leg filled, issuing unwind"
        );
        self.apply_fill(market, filled_side, fill)?;
        metrics::inc_broken_pairs();

        match self.attempt_unwind(market, filled_side, fill.filled_quantity).await {
            Ok(()) => Ok(CycleOutcome::BrokenPair {
                filled_side,
                filled_quantity: fill.filled_quantity,
                unwound: true,
                unwind_error: None,
            }),
            Err(e) => {
                metrics::inc_unwinds_failed();
                error!(side = %filled_side, error = %e, "Unwind failed; imbalance stands");
                Ok(CycleOutcome::BrokenPair {
                    filled_side,
                    filled_quantity: fill.filled_quantity,
                    unwound: false,
                    unwind_error: Some(e),
                })
            }
        }
    }

    /// Best-effort sell of exactly the filled quantity at the current best
    /// bid. No retries here; later cycles rebalance naturally.
    async fn attempt_unwind(
        &self,
        market: &Market,
        side: Outcome,
        quantity: Decimal,
    ) -> Result<(), ExecutionError> {
        metrics::inc_unwinds_attempted();

        let token_id = market.token_id(side);
        let best_bid =
            self.books
                .best_bid(token_id)
                .ok_or_else(|| ExecutionError::UnwindFailed {
                    side,
                    shares: quantity,
                    reason: "no bids available".to_string(),
                })?;

        let intent = self.build_intent(market, side, Direction::Sell, best_bid.price, quantity);
        info!(
            side = %side,
            price = %best_bid.price,
            quantity = %quantity,
            "Submitting unwind sell"
        );

        let result =
            match tokio::time::timeout(self.submission_timeout, self.gateway.submit(&intent)).await
            {
                Ok(result) => result,
                Err(_) => {
                    if let Err(e) = self.gateway.cancel(&intent.intent_id).await {
                        warn!(intent = %intent.intent_id, error = %e, "Cancel after timeout failed");
                    }
                    return Err(ExecutionError::UnwindFailed {
                        side,
                        shares: quantity,
                        reason: "submission timed out".to_string(),
                    });
                }
            };

        if result.is_success() {
            self.ledger
                .apply_unwind(&market.id, side, &result, OffsetDateTime::now_utc())
                .map_err(|e| ExecutionError::UnwindFailed {
                    side,
                    shares: quantity,
                    reason: e.to_string(),
                })?;
            info!(side = %side, sold = %result.filled_quantity, "Unwind applied");
            Ok(())
        } else {
            Err(ExecutionError::UnwindFailed {
                side,
                shares: quantity,
                reason: format!("unwind order {}", result.status),
            })
        }
    }

    /// Apply a buy fill to the ledger and emit telemetry for it.
    fn apply_fill(
        &self,
        market: &Market,
        side: Outcome,
        fill: &FillResult,
    ) -> Result<(), EngineError> {
        let now = OffsetDateTime::now_utc();
        self.ledger.apply(&market.id, side, fill, now)?;

        if let Some(position) = self.ledger.snapshot(&market.id) {
            self.telemetry.emit(TradeEvent {
                timestamp: now.unix_timestamp(),
                market_id: market.id.clone(),
                side,
                price: fill.avg_price,
                shares: fill.filled_quantity,
                cost: fill.cost(),
                combined_price: position.avg_combined_price(),
                estimated_pnl: position.guaranteed_profit(),
            });
        }
        Ok(())
    }

    fn build_intent(
        &self,
        market: &Market,
        side: Outcome,
        direction: Direction,
        price: Decimal,
        quantity: Decimal,
    ) -> OrderIntent {
        let seq = self.intent_seq.fetch_add(1, Ordering::Relaxed);
        let tag = match direction {
            Direction::Buy => "buy",
            Direction::Sell => "unwind",
        };
        OrderIntent {
            intent_id: format!("{}-{}-{}-{}", market.id, tag, side.to_string().to_lowercase(), seq),
            market_id: market.id.clone(),
            side,
            token_id: market.token_id(side).to_string(),
            direction,
            price,
            quantity,
            submitted_at: OffsetDateTime::now_utc(),
        }
    }
}
