//! Book-update driven evaluation loop.
//!
//! One logical evaluation stream per market: a book event triggers at most
//! one evaluation for the owning market, and no market starts a new cycle
//! while a previous pair's legs are outstanding. Distinct markets evaluate
//! and execute fully in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use futures::{Stream, StreamExt};
use time::OffsetDateTime;
use tracing::{debug, error, info};

use super::coordinator::ExecutionCoordinator;
use super::evaluator::{evaluate, Decision};
use super::risk::RiskGate;
use crate::config::EngineConfig;
use crate::error::{LedgerError, SkipReason};
use crate::gateway::OrderGateway;
use crate::market::{Market, MarketDirectory, Resolution};
use crate::metrics;
use crate::orderbook::{BookEvent, OrderBookCache};
use crate::telemetry::TelemetrySink;
use crate::trading::{Position, PositionLedger};

/// The assembled evaluation/execution engine.
pub struct Engine {
    config: EngineConfig,
    books: Arc<OrderBookCache>,
    ledger: Arc<PositionLedger>,
    directory: Arc<dyn MarketDirectory>,
    gate: RiskGate,
    coordinator: Arc<ExecutionCoordinator>,
    // One guard per market; holding it spans snapshot, admission and the
    // leg join, which keeps capacity accounting race-free.
    cycles: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl Engine {
    /// Assemble an engine over the external collaborator seams.
    pub fn new(
        config: EngineConfig,
        directory: Arc<dyn MarketDirectory>,
        gateway: Arc<dyn OrderGateway>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Arc<Self> {
        let books = Arc::new(OrderBookCache::new());
        let ledger = Arc::new(PositionLedger::new());
        let coordinator = Arc::new(ExecutionCoordinator::new(
            gateway,
            ledger.clone(),
            books.clone(),
            telemetry,
            &config,
        ));
        let gate = RiskGate::from_config(&config);

        Arc::new(Self {
            config,
            books,
            ledger,
            directory,
            gate,
            coordinator,
            cycles: DashMap::new(),
        })
    }

    /// Shared book cache.
    pub fn books(&self) -> &Arc<OrderBookCache> {
        &self.books
    }

    /// Shared position ledger.
    pub fn ledger(&self) -> &Arc<PositionLedger> {
        &self.ledger
    }

    /// Consume a book-update stream until it ends.
    ///
    /// The stream is push-based and unordered across tokens; gaps are
    /// tolerated, reconnection is the producer's concern.
    pub async fn run(self: Arc<Self>, stream: impl Stream<Item = BookEvent>) {
        futures::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            self.on_book_event(event).await;
        }
        info!("Book update stream ended");
    }

    /// Ingest one book update and evaluate the owning market.
    pub async fn on_book_event(self: &Arc<Self>, event: BookEvent) {
        metrics::inc_book_updates();
        self.books.apply_event(&event);

        let Some(market) = self.directory.market_for_token(&event.token_id).await else {
            debug!(token = %event.token_id, "Book update for unknown token");
            return;
        };

        self.evaluate_market(market).await;
    }

    /// Mark a market resolved, locking its position terminal.
    pub fn resolve_market(
        &self,
        market_id: &str,
        resolution: Resolution,
    ) -> Result<(), LedgerError> {
        self.ledger.resolve(market_id, resolution)
    }

    /// One evaluation cycle for a market, if one is admissible right now.
    async fn evaluate_market(self: &Arc<Self>, market: Market) {
        if !market.resolution.is_pending() {
            // Late events for a resolved market only archive the position.
            if self.ledger.resolve(&market.id, market.resolution).is_ok() {
                info!(market = %market.id, resolution = ?market.resolution, "Market resolved; position archived");
            }
            return;
        }

        let now = OffsetDateTime::now_utc();
        let seconds_to_deadline = market.seconds_to_deadline(now);
        if seconds_to_deadline <= self.config.trading_cutoff_secs {
            self.log_skip(
                &market,
                &SkipReason::TradingCutoff {
                    seconds_to_deadline,
                },
            );
            return;
        }

        let guard = self
            .cycles
            .entry(market.id.clone())
            .or_default()
            .clone();
        let Ok(permit) = guard.try_lock_owned() else {
            self.log_skip(&market, &SkipReason::CycleInFlight);
            return;
        };

        let timer = metrics::timer_evaluation();
        let best_yes = self.books.best_ask(&market.yes_token_id);
        let best_no = self.books.best_ask(&market.no_token_id);
        let position = self
            .ledger
            .snapshot(&market.id)
            .unwrap_or_else(|| Position::new(market.id.clone()));

        // The ledger can learn of a resolution before the directory
        // snapshot reflects it; a terminal position ends trading here.
        if position.is_resolved() {
            debug!(market = %market.id, "Position resolved; market no longer tradeable");
            return;
        }

        let opportunity = match evaluate(&market, best_yes, best_no, &position, &self.config) {
            Decision::Admit(opportunity) => opportunity,
            Decision::Skip(reason) => {
                self.log_skip(&market, &reason);
                return;
            }
        };

        let minutes = market.minutes_from_start(now);
        if let Err(reason) = self.gate.admit(&position, minutes) {
            self.log_skip(&market, &reason);
            return;
        }

        metrics::inc_opportunities_admitted();
        info!(
            market = %market.id,
            shares = opportunity.shares,
            combined_raw = %opportunity.combined_raw,
            "Opportunity admitted"
        );
        drop(timer);

        // The permit rides into the task: the market stays closed to new
        // cycles until both legs have joined.
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = permit;
            match this.coordinator.execute(&market, &opportunity).await {
                Ok(outcome) => debug!(market = %market.id, ?outcome, "Cycle complete"),
                Err(e) => error!(market = %market.id, error = %e, "Cycle failed"),
            }
        });
    }

    fn log_skip(&self, market: &Market, reason: &SkipReason) {
        metrics::inc_evaluations_skipped(skip_label(reason));
        debug!(market = %market.id, %reason, "Evaluation skipped");
    }
}

/// Static label for the skip counter.
fn skip_label(reason: &SkipReason) -> &'static str {
    match reason {
        SkipReason::NoLiquidity { .. } => "no_liquidity",
        SkipReason::PriceAboveCeiling { .. } => "price_above_ceiling",
        SkipReason::BelowMinOrder { .. } => "below_min_order",
        SkipReason::PositionLimitReached { .. } => "position_limit",
        SkipReason::ImbalanceRejected { .. } => "imbalance",
        SkipReason::TradingCutoff { .. } => "trading_cutoff",
        SkipReason::CycleInFlight => "cycle_in_flight",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, ScriptedFill};
    use crate::market::StaticDirectory;
    use crate::telemetry::NullSink;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn live_market(id: &str) -> Market {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Market {
            id: id.to_string(),
            yes_token_id: format!("{id}-yes"),
            no_token_id: format!("{id}-no"),
            start_timestamp: now - 10,
            resolution_deadline: now + 600,
            resolution: Resolution::Pending,
        }
    }

    fn engine_with(
        markets: Vec<Market>,
        gateway: MockGateway,
        config: EngineConfig,
    ) -> (Arc<Engine>, Arc<MockGateway>) {
        let directory = Arc::new(StaticDirectory::new());
        for market in markets {
            directory.insert(market);
        }
        let gateway = Arc::new(gateway);
        let engine = Engine::new(config, directory, gateway.clone(), Arc::new(NullSink));
        (engine, gateway)
    }

    fn tradeable_events(id: &str) -> Vec<BookEvent> {
        vec![
            BookEvent::new(
                format!("{id}-yes"),
                vec![(dec!(0.38), dec!(100))],
                vec![(dec!(0.40), dec!(100))],
            ),
            BookEvent::new(
                format!("{id}-no"),
                vec![(dec!(0.48), dec!(100))],
                vec![(dec!(0.50), dec!(100))],
            ),
        ]
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn book_events_drive_execution() {
        let (engine, gateway) =
            engine_with(vec![live_market("mkt")], MockGateway::new(), EngineConfig::default());

        for event in tradeable_events("mkt") {
            engine.on_book_event(event).await;
        }
        settle().await;

        // First event had only one book; second admitted a 55-share pair.
        let position = engine.ledger().snapshot("mkt").unwrap();
        assert_eq!(position.yes_shares(), dec!(55));
        assert_eq!(position.no_shares(), dec!(55));
        assert_eq!(gateway.submissions().len(), 2);
    }

    #[tokio::test]
    async fn unknown_token_is_tolerated() {
        let (engine, gateway) =
            engine_with(vec![live_market("mkt")], MockGateway::new(), EngineConfig::default());

        engine
            .on_book_event(BookEvent::new("stray-token", vec![], vec![(dec!(0.40), dec!(10))]))
            .await;
        settle().await;

        assert!(engine.ledger().snapshot("mkt").is_none());
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn in_flight_market_skips_new_cycles() {
        let gateway = MockGateway::with_latency(Duration::from_millis(100));
        let (engine, gateway) =
            engine_with(vec![live_market("mkt")], gateway, EngineConfig::default());

        for event in tradeable_events("mkt") {
            engine.on_book_event(event).await;
        }
        // Legs are in flight; this event must not start a second pair.
        engine
            .on_book_event(BookEvent::new(
                "mkt-yes",
                vec![(dec!(0.38), dec!(100))],
                vec![(dec!(0.40), dec!(100))],
            ))
            .await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(gateway.submissions().len(), 2);
    }

    #[tokio::test]
    async fn independent_markets_run_in_parallel() {
        let gateway = MockGateway::with_latency(Duration::from_millis(50));
        let (engine, gateway) = engine_with(
            vec![live_market("a"), live_market("b")],
            gateway,
            EngineConfig::default(),
        );

        for event in tradeable_events("a").into_iter().chain(tradeable_events("b")) {
            engine.on_book_event(event).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(engine.ledger().snapshot("a").is_some());
        assert!(engine.ledger().snapshot("b").is_some());
        assert_eq!(gateway.submissions().len(), 4);
    }

    #[tokio::test]
    async fn cutoff_blocks_trading_near_deadline() {
        let mut market = live_market("mkt");
        market.resolution_deadline = OffsetDateTime::now_utc().unix_timestamp() + 20;
        let (engine, gateway) = engine_with(vec![market], MockGateway::new(), EngineConfig::default());

        for event in tradeable_events("mkt") {
            engine.on_book_event(event).await;
        }
        settle().await;

        // Default cutoff is 30s before resolution.
        assert!(engine.ledger().snapshot("mkt").is_none());
        assert!(gateway.submissions().is_empty());
    }

    #[tokio::test]
    async fn resolved_market_archives_instead_of_trading() {
        let mut market = live_market("mkt");
        market.resolution = Resolution::ResolvedYes;
        let (engine, gateway) = engine_with(vec![market], MockGateway::new(), EngineConfig::default());

        for event in tradeable_events("mkt") {
            engine.on_book_event(event).await;
        }
        settle().await;

        assert!(gateway.submissions().is_empty());
        let position = engine.ledger().snapshot("mkt").unwrap();
        assert!(position.is_resolved());
    }

    #[tokio::test]
    async fn risk_gate_rejects_lopsided_position_in_steady_state() {
        let mut market = live_market("mkt");
        // Five minutes in: the steady-state ratio (1.3) applies.
        market.start_timestamp = OffsetDateTime::now_utc().unix_timestamp() - 300;
        let gateway = MockGateway::new();
        // First pair settles lopsided: YES fills 55, NO fills only 20.
        gateway.script("mkt-no", ScriptedFill::Partial(dec!(20)));
        let (engine, gateway) = engine_with(vec![market], gateway, EngineConfig::default());

        for event in tradeable_events("mkt") {
            engine.on_book_event(event).await;
        }
        settle().await;

        let position = engine.ledger().snapshot("mkt").unwrap();
        assert_eq!(position.yes_shares(), dec!(55));
        assert_eq!(position.no_shares(), dec!(20));
        assert_eq!(gateway.submissions().len(), 2);

        // Next update still prices well, but 55 > 20 * 1.3 blocks the pair.
        engine
            .on_book_event(BookEvent::new(
                "mkt-yes",
                vec![(dec!(0.38), dec!(100))],
                vec![(dec!(0.40), dec!(100))],
            ))
            .await;
        settle().await;

        assert_eq!(gateway.submissions().len(), 2);
    }
}
