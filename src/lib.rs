//! Dual-leg arbitrage execution engine for binary prediction markets.
//!
//! When the best asks of a binary market's two outcome tokens sum below
//! $1.00 with room to spare for slippage, buying equal quantities of both
//! sides locks in profit regardless of the outcome:
//!
//! ```text
//! YES ask:  $0.40  (+ $0.02 buffer)
//! NO ask:   $0.50  (+ $0.02 buffer)
//! ──────────────────────────────────
//! Pair:     $0.94 < $1.00 payout ✅
//! Edge:     $0.10 per pair at the touch
//! ```
//!
//! The hard part is not the signal but the execution: every book update
//! re-evaluates the market, sizing is bounded by capital and order limits,
//! a time-indexed gate bounds how lopsided a position may become, both legs
//! submit concurrently, and a broken pair (one leg filled, one dead) is
//! unwound rather than left as directional exposure.
//!
//! # Modules
//!
//! - [`config`]: Engine configuration and limits
//! - [`error`]: Skip conditions and error types
//! - [`market`]: Market types and the directory seam
//! - [`orderbook`]: Ladders and the per-token book cache
//! - [`trading`]: Orders, fills, positions and the ledger
//! - [`gateway`]: The external order gateway seam
//! - [`arbitrage`]: Evaluation, risk gating and execution
//! - [`telemetry`]: Fire-and-forget trade events
//! - [`metrics`]: Counters and latency histograms

pub mod arbitrage;
pub mod config;
pub mod error;
pub mod gateway;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod telemetry;
pub mod trading;

pub use arbitrage::{CycleOutcome, Decision, Engine, Opportunity, RiskGate};
pub use config::EngineConfig;
pub use error::{EngineError, Result, SkipReason};
