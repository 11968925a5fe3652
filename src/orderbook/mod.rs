//! Order book data structures and the per-token book cache.
//!
//! This module handles:
//! - Price level and ladder types
//! - Book-update events from the external stream
//! - Wholesale-replacement caching of the latest ladders

pub mod cache;
pub mod types;

pub use cache::{OrderBookCache, TokenBook};
pub use types::{BookEvent, BookLevel, LevelStack};
