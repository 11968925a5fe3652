//! Per-market position record.

use std::collections::HashSet;

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::error::LedgerError;
use crate::market::{Outcome, Resolution};
use crate::trading::order::FillResult;

/// Derived lifecycle state of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    /// No shares on either side.
    Empty,
    /// Shares on exactly one side; the pair is still being assembled.
    Building,
    /// Equal shares on both sides.
    Balanced,
    /// Shares on both sides, unequal.
    Imbalanced,
    /// Owning market resolved; terminal.
    Resolved,
}

/// Outcome of applying a fill to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Fill applied; state changed.
    Applied,
    /// Intent id already applied; state unchanged.
    Duplicate,
}

/// A corrective sell recorded against a position.
///
/// Ledger-neutral: proceeds are tracked here, never folded into the
/// position's `total_cost`.
#[derive(Debug, Clone)]
pub struct UnwindRecord {
    /// Intent id of the unwind sell.
    pub intent_id: String,
    /// Side that was sold back.
    pub side: Outcome,
    /// Shares sold.
    pub shares: Decimal,
    /// Sale proceeds.
    pub proceeds: Decimal,
    /// When the unwind fill was applied.
    pub at: OffsetDateTime,
}

/// Mutable per-market record of shares held and capital committed.
///
/// `apply` and `apply_unwind` are the only mutators; everything else reads.
/// Fill application is idempotent on intent id.
#[derive(Debug, Clone)]
pub struct Position {
    market_id: String,
    yes_shares: Decimal,
    no_shares: Decimal,
    total_cost: Decimal,
    last_update: Option<OffsetDateTime>,
    applied: HashSet<String>,
    unwinds: Vec<UnwindRecord>,
    resolution: Resolution,
}

impl Position {
    /// Create an empty position for a market.
    pub fn new(market_id: impl Into<String>) -> Self {
        Self {
            market_id: market_id.into(),
            yes_shares: Decimal::ZERO,
            no_shares: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            last_update: None,
            applied: HashSet::new(),
            unwinds: Vec::new(),
            resolution: Resolution::Pending,
        }
    }

    /// Market this position belongs to.
    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    /// Shares held on a side.
    pub fn shares(&self, side: Outcome) -> Decimal {
        match side {
            Outcome::Yes => self.yes_shares,
            Outcome::No => self.no_shares,
        }
    }

    /// YES shares held.
    pub fn yes_shares(&self) -> Decimal {
        self.yes_shares
    }

    /// NO shares held.
    pub fn no_shares(&self) -> Decimal {
        self.no_shares
    }

    /// Sum of (fill price x filled shares) over all applied buy fills.
    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    /// Time of the last applied fill or unwind.
    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.last_update
    }

    /// Matched YES/NO pairs; each pays out exactly 1.0 at resolution.
    pub fn matched_pairs(&self) -> Decimal {
        self.yes_shares.min(self.no_shares)
    }

    /// Average cost per matched pair; zero while no pair exists.
    pub fn avg_combined_price(&self) -> Decimal {
        let pairs = self.matched_pairs();
        if pairs.is_zero() {
            Decimal::ZERO
        } else {
            self.total_cost / pairs
        }
    }

    /// Profit locked in at resolution, assuming matched pairs only.
    /// Negative while capital sits in an unmatched leg.
    pub fn guaranteed_profit(&self) -> Decimal {
        self.matched_pairs() - self.total_cost
    }

    /// Total proceeds from unwind sells, tracked apart from cost.
    pub fn unwind_proceeds(&self) -> Decimal {
        self.unwinds.iter().map(|u| u.proceeds).sum()
    }

    /// Recorded unwind events.
    pub fn unwinds(&self) -> &[UnwindRecord] {
        &self.unwinds
    }

    /// Ratio of the larger side to the smaller side.
    ///
    /// `None` means unbounded (one side empty, the other not); `Some(1)`
    /// when both sides are empty.
    pub fn imbalance_ratio(&self) -> Option<Decimal> {
        let larger = self.yes_shares.max(self.no_shares);
        let smaller = self.yes_shares.min(self.no_shares);

        if larger.is_zero() {
            Some(Decimal::ONE)
        } else if smaller.is_zero() {
            None
        } else {
            Some(larger / smaller)
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PositionState {
        if !self.resolution.is_pending() {
            PositionState::Resolved
        } else if self.yes_shares.is_zero() && self.no_shares.is_zero() {
            PositionState::Empty
        } else if self.yes_shares.is_zero() || self.no_shares.is_zero() {
            PositionState::Building
        } else if self.yes_shares == self.no_shares {
            PositionState::Balanced
        } else {
            PositionState::Imbalanced
        }
    }

    /// Whether the owning market has resolved.
    pub fn is_resolved(&self) -> bool {
        !self.resolution.is_pending()
    }

    /// Apply a buy fill. The sole mutator of share and cost state.
    ///
    /// Applying the same intent id twice is a no-op reported as
    /// [`ApplyOutcome::Duplicate`]; applying to a resolved position fails.
    pub fn apply(
        &mut self,
        side: Outcome,
        fill: &FillResult,
        at: OffsetDateTime,
    ) -> Result<ApplyOutcome, LedgerError> {
        if self.is_resolved() {
            return Err(LedgerError::PositionResolved {
                market_id: self.market_id.clone(),
            });
        }

        if !self.applied.insert(fill.intent_id.clone()) {
            return Ok(ApplyOutcome::Duplicate);
        }

        match side {
            Outcome::Yes => self.yes_shares += fill.filled_quantity,
            Outcome::No => self.no_shares += fill.filled_quantity,
        }
        self.total_cost += fill.cost();
        self.last_update = Some(at);

        Ok(ApplyOutcome::Applied)
    }

    /// Record an unwind sell: shares come off the sold side, proceeds are
    /// tracked separately, `total_cost` is untouched.
    pub fn apply_unwind(
        &mut self,
        side: Outcome,
        fill: &FillResult,
        at: OffsetDateTime,
    ) -> Result<ApplyOutcome, LedgerError> {
        if self.is_resolved() {
            return Err(LedgerError::PositionResolved {
                market_id: self.market_id.clone(),
            });
        }

        if !self.applied.insert(fill.intent_id.clone()) {
            return Ok(ApplyOutcome::Duplicate);
        }

        let sold = fill.filled_quantity.min(self.shares(side));
        match side {
            Outcome::Yes => self.yes_shares -= sold,
            Outcome::No => self.no_shares -= sold,
        }
        self.unwinds.push(UnwindRecord {
            intent_id: fill.intent_id.clone(),
            side,
            shares: sold,
            proceeds: fill.cost(),
            at,
        });
        self.last_update = Some(at);

        Ok(ApplyOutcome::Applied)
    }

    /// Transition the position terminal. Further mutation fails.
    pub fn resolve(&mut self, resolution: Resolution) -> Result<(), LedgerError> {
        if self.is_resolved() {
            return Err(LedgerError::PositionResolved {
                market_id: self.market_id.clone(),
            });
        }
        self.resolution = resolution;
        Ok(())
    }
}
