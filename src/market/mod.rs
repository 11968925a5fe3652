//! Market types and directory lookup.
//!
//! This module handles:
//! - Market, outcome and resolution types
//! - The read-only directory seam to external market discovery

pub mod directory;
pub mod types;

pub use directory::{MarketDirectory, StaticDirectory};
pub use types::{Market, Outcome, Resolution};
