//! Market-keyed position ledger.

use dashmap::DashMap;
use time::OffsetDateTime;

use crate::error::LedgerError;
use crate::market::{Outcome, Resolution};
use crate::trading::order::FillResult;
use crate::trading::position::{ApplyOutcome, Position};

/// Owns every [`Position`], keyed by market id.
///
/// Positions are created lazily on the first applied fill and kept after
/// resolution so that late mutation attempts fail instead of silently
/// re-creating state. Single-writer discipline: only the execution
/// coordinator applies fills; all other components read snapshots.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: DashMap<String, Position>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a market's position, if one exists.
    pub fn snapshot(&self, market_id: &str) -> Option<Position> {
        self.positions.get(market_id).map(|p| p.clone())
    }

    /// Apply a buy fill, creating the position on first use.
    pub fn apply(
        &self,
        market_id: &str,
        side: Outcome,
        fill: &FillResult,
        at: OffsetDateTime,
    ) -> Result<ApplyOutcome, LedgerError> {
        let mut entry = self
            .positions
            .entry(market_id.to_string())
            .or_insert_with(|| Position::new(market_id));
        entry.apply(side, fill, at)
    }

    /// Record an unwind sell against an existing position.
    pub fn apply_unwind(
        &self,
        market_id: &str,
        side: Outcome,
        fill: &FillResult,
        at: OffsetDateTime,
    ) -> Result<ApplyOutcome, LedgerError> {
        let mut entry = self
            .positions
            .get_mut(market_id)
            .ok_or_else(|| LedgerError::UnknownMarket {
                market_id: market_id.to_string(),
            })?;
        entry.apply_unwind(side, fill, at)
    }

    /// Transition a market's position terminal.
    ///
    /// Creates an empty, already-resolved position for untraded markets so
    /// that any later fill is rejected rather than lazily re-created.
    pub fn resolve(&self, market_id: &str, resolution: Resolution) -> Result<(), LedgerError> {
        let mut entry = self
            .positions
            .entry(market_id.to_string())
            .or_insert_with(|| Position::new(market_id));
        entry.resolve(resolution)
    }

    /// Market ids with a position on record.
    pub fn market_ids(&self) -> Vec<String> {
        self.positions.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of positions on record.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
