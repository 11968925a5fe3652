//! Latest-book cache keyed by outcome token.

use dashmap::DashMap;
use time::OffsetDateTime;

use super::types::{sorted_asks, sorted_bids, BookEvent, BookLevel, LevelStack};

/// Both ladders for one token.
#[derive(Debug, Clone, Default)]
pub struct TokenBook {
    /// Ask levels, ascending by price.
    pub asks: LevelStack,
    /// Bid levels, descending by price.
    pub bids: LevelStack,
    /// When either side was last replaced.
    pub updated_at: Option<OffsetDateTime>,
}

impl TokenBook {
    /// Best (lowest) ask, if any.
    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    /// Best (highest) bid, if any.
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }
}

/// Holds the latest ladders per outcome token.
///
/// Each update replaces a token's ladder wholesale; there are no merge
/// semantics. Replacement is atomic relative to readers of that token.
#[derive(Debug, Default)]
pub struct OrderBookCache {
    books: DashMap<String, TokenBook>,
}

impl OrderBookCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ask ladder for a token.
    pub fn update(&self, token_id: &str, asks: Vec<BookLevel>) {
        let mut entry = self.books.entry(token_id.to_string()).or_default();
        entry.asks = sorted_asks(asks);
        entry.updated_at = Some(OffsetDateTime::now_utc());
    }

    /// Replace the bid ladder for a token.
    pub fn update_bids(&self, token_id: &str, bids: Vec<BookLevel>) {
        let mut entry = self.books.entry(token_id.to_string()).or_default();
        entry.bids = sorted_bids(bids);
        entry.updated_at = Some(OffsetDateTime::now_utc());
    }

    /// Replace both ladders from a stream event.
    pub fn apply_event(&self, event: &BookEvent) {
        let mut entry = self.books.entry(event.token_id.clone()).or_default();
        entry.asks = sorted_asks(event.asks.iter().copied());
        entry.bids = sorted_bids(event.bids.iter().copied());
        entry.updated_at = Some(OffsetDateTime::now_utc());
    }

    /// Best ask for a token. `None` means no liquidity this cycle.
    pub fn best_ask(&self, token_id: &str) -> Option<BookLevel> {
        self.books.get(token_id).and_then(|b| b.best_ask())
    }

    /// Best bid for a token.
    pub fn best_bid(&self, token_id: &str) -> Option<BookLevel> {
        self.books.get(token_id).and_then(|b| b.best_bid())
    }

    /// Snapshot of a token's book.
    pub fn book(&self, token_id: &str) -> Option<TokenBook> {
        self.books.get(token_id).map(|b| b.clone())
    }

    /// Number of tokens with cached books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
