//! Scriptable mock gateway for unit and integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::OrderGateway;
use crate::error::ExecutionError;
use crate::trading::{FillResult, OrderIntent};

/// Behavior the mock plays back for one submission.
#[derive(Debug, Clone)]
pub enum ScriptedFill {
    /// Fill the full quantity at the intent's limit price.
    Fill,
    /// Fill only this quantity at the intent's limit price.
    Partial(Decimal),
    /// Rest unfilled and report nothing done.
    Unfilled,
    /// Report a submission failure.
    Fail(String),
    /// Never resolve; used to exercise the submission timeout.
    Hang,
}

/// Mock order gateway with per-token scripted outcomes.
///
/// Outcomes queue per token id and are consumed in order; tokens with no
/// script fill completely. Every submission and cancel is logged for
/// assertions.
#[derive(Debug, Default)]
pub struct MockGateway {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedFill>>>,
    submissions: Mutex<Vec<OrderIntent>>,
    cancels: Mutex<Vec<String>>,
    latency: Option<Duration>,
    order_seq: AtomicU64,
}

impl MockGateway {
    /// Create a mock that fills everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that sleeps before resolving each submission.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Queue a scripted outcome for the next submission on a token.
    pub fn script(&self, token_id: &str, outcome: ScriptedFill) {
        self.scripts
            .lock()
            .unwrap()
            .entry(token_id.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Intents submitted so far.
    pub fn submissions(&self) -> Vec<OrderIntent> {
        self.submissions.lock().unwrap().clone()
    }

    /// Intent ids cancelled so far.
    pub fn cancels(&self) -> Vec<String> {
        self.cancels.lock().unwrap().clone()
    }

    fn next_order_id(&self) -> String {
        format!("mock-ord-{}", self.order_seq.fetch_add(1, Ordering::Relaxed))
    }

    fn pop_script(&self, token_id: &str) -> ScriptedFill {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(token_id)
            .and_then(|q| q.pop_front())
            .unwrap_or(ScriptedFill::Fill)
    }
}

#[async_trait]
impl OrderGateway for MockGateway {
    async fn submit(&self, intent: &OrderIntent) -> FillResult {
        self.submissions.lock().unwrap().push(intent.clone());
        let script = self.pop_script(&intent.token_id);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match script {
            ScriptedFill::Fill => FillResult::filled(intent, intent.price, self.next_order_id()),
            ScriptedFill::Partial(quantity) => {
                FillResult::partial(intent, quantity, intent.price, self.next_order_id())
            }
            ScriptedFill::Unfilled => FillResult::unfilled(intent.intent_id.clone()),
            ScriptedFill::Fail(_) => FillResult::failed(intent.intent_id.clone()),
            ScriptedFill::Hang => std::future::pending().await,
        }
    }

    async fn cancel(&self, intent_id: &str) -> Result<(), ExecutionError> {
        self.cancels.lock().unwrap().push(intent_id.to_string());
        Ok(())
    }
}
