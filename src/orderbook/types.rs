//! Order book types and data structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Single price level in an order book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookLevel {
    /// Price at this level.
    pub price: Decimal,
    /// Total size available at this price.
    pub size: Decimal,
}

impl BookLevel {
    /// Create a new price level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Stack-allocated level storage; books near the touch are shallow.
pub type LevelStack = SmallVec<[BookLevel; 8]>;

/// Sort and sanitize an ask ladder: ascending by price, junk levels dropped.
pub fn sorted_asks(levels: impl IntoIterator<Item = BookLevel>) -> LevelStack {
    let mut asks: LevelStack = levels
        .into_iter()
        .filter(|l| l.price > Decimal::ZERO && l.size > Decimal::ZERO)
        .collect();
    asks.sort_by(|a, b| a.price.cmp(&b.price));
    asks
}

/// Sort and sanitize a bid ladder: descending by price, junk levels dropped.
pub fn sorted_bids(levels: impl IntoIterator<Item = BookLevel>) -> LevelStack {
    let mut bids: LevelStack = levels
        .into_iter()
        .filter(|l| l.price > Decimal::ZERO && l.size > Decimal::ZERO)
        .collect();
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    bids
}

/// One book-update event from the external stream.
///
/// Ladders are full snapshots, replaced wholesale; there is no incremental
/// patching contract. Either side may be empty.
#[derive(Debug, Clone)]
pub struct BookEvent {
    /// Token whose book changed.
    pub token_id: String,
    /// Full bid snapshot.
    pub bids: Vec<BookLevel>,
    /// Full ask snapshot.
    pub asks: Vec<BookLevel>,
}

impl BookEvent {
    /// Convenience constructor from (price, size) pairs.
    pub fn new(
        token_id: impl Into<String>,
        bids: Vec<(Decimal, Decimal)>,
        asks: Vec<(Decimal, Decimal)>,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            bids: bids.into_iter().map(|(p, s)| BookLevel::new(p, s)).collect(),
            asks: asks.into_iter().map(|(p, s)| BookLevel::new(p, s)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn book_level_creation() {
        let level = BookLevel::new(dec!(0.50), dec!(100));
        assert_eq!(level.price, dec!(0.50));
        assert_eq!(level.size, dec!(100));
    }

    #[test]
    fn sorted_asks_ascending_and_sanitized() {
        let asks = sorted_asks(vec![
            BookLevel::new(dec!(0.52), dec!(10)),
            BookLevel::new(dec!(0.50), dec!(5)),
            BookLevel::new(dec!(0.51), dec!(0)),
            BookLevel::new(dec!(0), dec!(100)),
        ]);

        assert_eq!(asks.len(), 2);
        assert_eq!(asks[0].price, dec!(0.50));
        assert_eq!(asks[1].price, dec!(0.52));
    }

    #[test]
    fn sorted_bids_descending() {
        let bids = sorted_bids(vec![
            BookLevel::new(dec!(0.47), dec!(10)),
            BookLevel::new(dec!(0.49), dec!(5)),
        ]);

        assert_eq!(bids[0].price, dec!(0.49));
        assert_eq!(bids[1].price, dec!(0.47));
    }
}
