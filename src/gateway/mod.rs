//! Order gateway seam.
//!
//! Signing, authentication and transport live behind this trait. Submission
//! uses resting (good-till-cancelled) semantics: an order that cannot cross
//! immediately stays on the book until filled or cancelled, and the gateway
//! reports the terminal outcome it observed. Gateway failures are collected
//! into [`FillStatus::Failed`](crate::trading::FillStatus::Failed) results,
//! never propagated as errors, so the coordinator can always reconcile a
//! joined pair of outcomes.

pub mod mock;

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::trading::{FillResult, OrderIntent};

/// External order gateway.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an intent and wait for its terminal outcome.
    async fn submit(&self, intent: &OrderIntent) -> FillResult;

    /// Best-effort cancel by client intent id.
    async fn cancel(&self, intent_id: &str) -> Result<(), ExecutionError>;
}

pub use mock::{MockGateway, ScriptedFill};
