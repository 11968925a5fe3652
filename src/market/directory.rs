//! Market directory lookup seam.
//!
//! Discovery, slug parsing and refresh polling live outside the engine; the
//! engine only needs read-only snapshot lookups keyed by market or token id.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::LedgerError;
use crate::market::{Market, Resolution};

/// Read-only market snapshot lookup.
#[async_trait]
pub trait MarketDirectory: Send + Sync {
    /// Market owning the given outcome token, if known.
    async fn market_for_token(&self, token_id: &str) -> Option<Market>;

    /// Market by id, if known.
    async fn market(&self, market_id: &str) -> Option<Market>;
}

/// In-memory directory for wiring and tests.
///
/// An external discovery loop inserts markets and records resolutions; the
/// engine reads snapshots.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    markets: DashMap<String, Market>,
    token_index: DashMap<String, String>,
}

impl StaticDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a market snapshot.
    pub fn insert(&self, market: Market) {
        self.token_index
            .insert(market.yes_token_id.clone(), market.id.clone());
        self.token_index
            .insert(market.no_token_id.clone(), market.id.clone());
        self.markets.insert(market.id.clone(), market);
    }

    /// Record a market's resolution. Set exactly once; a second attempt fails.
    pub fn resolve(&self, market_id: &str, resolution: Resolution) -> Result<(), LedgerError> {
        let mut entry = self
            .markets
            .get_mut(market_id)
            .ok_or_else(|| LedgerError::UnknownMarket {
                market_id: market_id.to_string(),
            })?;

        if !entry.resolution.is_pending() {
            return Err(LedgerError::PositionResolved {
                market_id: market_id.to_string(),
            });
        }

        entry.resolution = resolution;
        Ok(())
    }

    /// Number of markets currently known.
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

#[async_trait]
impl MarketDirectory for StaticDirectory {
    async fn market_for_token(&self, token_id: &str) -> Option<Market> {
        let market_id = self.token_index.get(token_id)?.clone();
        self.markets.get(&market_id).map(|m| m.clone())
    }

    async fn market(&self, market_id: &str) -> Option<Market> {
        self.markets.get(market_id).map(|m| m.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_market(id: &str) -> Market {
        Market {
            id: id.to_string(),
            yes_token_id: format!("{id}-yes"),
            no_token_id: format!("{id}-no"),
            start_timestamp: 0,
            resolution_deadline: 900,
            resolution: Resolution::Pending,
        }
    }

    #[tokio::test]
    async fn lookup_by_token_and_id() {
        let directory = StaticDirectory::new();
        directory.insert(test_market("mkt-1"));

        let by_token = directory.market_for_token("mkt-1-no").await.unwrap();
        assert_eq!(by_token.id, "mkt-1");

        let by_id = directory.market("mkt-1").await.unwrap();
        assert_eq!(by_id.yes_token_id, "mkt-1-yes");

        assert!(directory.market_for_token("unknown").await.is_none());
    }

    #[tokio::test]
    async fn resolution_is_set_exactly_once() {
        let directory = StaticDirectory::new();
        directory.insert(test_market("mkt-1"));

        directory
            .resolve("mkt-1", Resolution::ResolvedYes)
            .unwrap();
        let market = directory.market("mkt-1").await.unwrap();
        assert_eq!(market.resolution, Resolution::ResolvedYes);

        let again = directory.resolve("mkt-1", Resolution::ResolvedNo);
        assert!(matches!(again, Err(LedgerError::PositionResolved { .. })));
    }

    #[test]
    fn resolving_unknown_market_fails() {
        let directory = StaticDirectory::new();
        let result = directory.resolve("nope", Resolution::ResolvedYes);
        assert!(matches!(result, Err(LedgerError::UnknownMarket { .. })));
    }
}
