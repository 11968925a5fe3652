//! Fire-and-forget trade telemetry.
//!
//! Emission must never block the evaluation cycle: sinks either hand the
//! event off immediately or drop it.

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::market::Outcome;

/// One executed-leg event for downstream reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TradeEvent {
    /// Unix timestamp (seconds) of the fill application.
    pub timestamp: i64,
    /// Market traded.
    pub market_id: String,
    /// Leg side.
    pub side: Outcome,
    /// Average fill price.
    pub price: Decimal,
    /// Filled shares.
    pub shares: Decimal,
    /// Capital consumed by the fill.
    pub cost: Decimal,
    /// Position's average cost per matched pair after the fill.
    pub combined_price: Decimal,
    /// Position's locked-in profit estimate after the fill.
    pub estimated_pnl: Decimal,
}

/// Non-blocking event sink.
pub trait TelemetrySink: Send + Sync {
    /// Emit an event. Failures are dropped, not retried.
    fn emit(&self, event: TradeEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&self, _event: TradeEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn emit(&self, event: TradeEvent) {
        info!(
            market = %event.market_id,
            side = %event.side,
            price = %event.price,
            shares = %event.shares,
            cost = %event.cost,
            combined = %event.combined_price,
            est_pnl = %event.estimated_pnl,
            "trade"
        );
    }
}

/// Forwards events over a bounded channel; drops when the consumer lags.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<TradeEvent>,
}

impl ChannelSink {
    /// Create a sink and its receiving end.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TradeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn emit(&self, event: TradeEvent) {
        // try_send keeps the hot path non-blocking; a full or closed
        // channel loses the event by contract.
        let _ = self.tx.try_send(event);
    }
}
