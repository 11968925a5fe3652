//! Market types for binary-outcome prediction markets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

/// One side of a binary market.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// The YES outcome token.
    #[strum(serialize = "YES", serialize = "yes")]
    #[default]
    Yes,
    /// The NO outcome token.
    #[strum(serialize = "NO", serialize = "no")]
    No,
}

impl Outcome {
    /// Get the opposite outcome.
    pub fn opposite(&self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }
}

/// Terminal state of a market, set exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Market has not resolved yet.
    #[default]
    Pending,
    /// YES token redeems for full value.
    ResolvedYes,
    /// NO token redeems for full value.
    ResolvedNo,
}

impl Resolution {
    /// Whether the market is still trading.
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }

    /// The winning outcome, if resolved.
    pub fn winner(&self) -> Option<Outcome> {
        match self {
            Resolution::Pending => None,
            Resolution::ResolvedYes => Some(Outcome::Yes),
            Resolution::ResolvedNo => Some(Outcome::No),
        }
    }
}

/// A binary-outcome market snapshot.
///
/// Immutable except for `resolution`, which the owning directory sets once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Unique market identifier.
    pub id: String,
    /// YES outcome token id.
    pub yes_token_id: String,
    /// NO outcome token id.
    pub no_token_id: String,
    /// Unix timestamp when the market opened.
    pub start_timestamp: i64,
    /// Unix timestamp of the resolution deadline.
    pub resolution_deadline: i64,
    /// Resolution state.
    pub resolution: Resolution,
}

impl Market {
    /// Get the token id for a given outcome.
    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Yes => &self.yes_token_id,
            Outcome::No => &self.no_token_id,
        }
    }

    /// Map a token id back to its outcome, if it belongs to this market.
    pub fn outcome_for_token(&self, token_id: &str) -> Option<Outcome> {
        if token_id == self.yes_token_id {
            Some(Outcome::Yes)
        } else if token_id == self.no_token_id {
            Some(Outcome::No)
        } else {
            None
        }
    }

    /// Minutes elapsed since market start, clamped at zero.
    ///
    /// Computed over whole seconds so window boundaries compare exactly.
    pub fn minutes_from_start(&self, now: OffsetDateTime) -> Decimal {
        let elapsed = (now.unix_timestamp() - self.start_timestamp).max(0);
        Decimal::from(elapsed) / Decimal::from(60)
    }

    /// Seconds until the resolution deadline; negative once past it.
    pub fn seconds_to_deadline(&self, now: OffsetDateTime) -> i64 {
        self.resolution_deadline - now.unix_timestamp()
    }

    /// Check if the deadline has passed.
    pub fn is_past_deadline(&self, now: OffsetDateTime) -> bool {
        self.seconds_to_deadline(now) <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_market() -> Market {
        Market {
            id: "mkt-1".to_string(),
            yes_token_id: "yes-token".to_string(),
            no_token_id: "no-token".to_string(),
            start_timestamp: 1_000_000,
            resolution_deadline: 1_000_900,
            resolution: Resolution::Pending,
        }
    }

    #[test]
    fn outcome_opposite_works() {
        assert_eq!(Outcome::Yes.opposite(), Outcome::No);
        assert_eq!(Outcome::No.opposite(), Outcome::Yes);
    }

    #[test]
    fn outcome_from_string_works() {
        use std::str::FromStr;
        assert_eq!(Outcome::from_str("YES").unwrap(), Outcome::Yes);
        assert_eq!(Outcome::from_str("no").unwrap(), Outcome::No);
    }

    #[test]
    fn token_lookup_round_trips() {
        let market = test_market();
        assert_eq!(market.token_id(Outcome::Yes), "yes-token");
        assert_eq!(market.outcome_for_token("no-token"), Some(Outcome::No));
        assert_eq!(market.outcome_for_token("other"), None);
    }

    #[test]
    fn minutes_from_start_is_exact_at_boundaries() {
        let market = test_market();
        let at = |secs: i64| OffsetDateTime::from_unix_timestamp(1_000_000 + secs).unwrap();

        assert_eq!(market.minutes_from_start(at(0)), dec!(0));
        assert_eq!(market.minutes_from_start(at(60)), dec!(1));
        assert_eq!(market.minutes_from_start(at(90)), dec!(1.5));
        assert_eq!(market.minutes_from_start(at(120)), dec!(2));
    }

    #[test]
    fn minutes_from_start_clamps_before_open() {
        let market = test_market();
        let before = OffsetDateTime::from_unix_timestamp(999_000).unwrap();
        assert_eq!(market.minutes_from_start(before), dec!(0));
    }

    #[test]
    fn deadline_accounting() {
        let market = test_market();
        let now = OffsetDateTime::from_unix_timestamp(1_000_880).unwrap();
        assert_eq!(market.seconds_to_deadline(now), 20);
        assert!(!market.is_past_deadline(now));

        let later = OffsetDateTime::from_unix_timestamp(1_000_900).unwrap();
        assert!(market.is_past_deadline(later));
    }

    #[test]
    fn resolution_winner() {
        assert_eq!(Resolution::Pending.winner(), None);
        assert_eq!(Resolution::ResolvedYes.winner(), Some(Outcome::Yes));
        assert_eq!(Resolution::ResolvedNo.winner(), Some(Outcome::No));
        assert!(Resolution::Pending.is_pending());
    }
}
