//! Engine configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Immutable per-run configuration for the execution engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    // === Admission ===
    /// Maximum buffered combined price admitted (e.g., 0.97).
    #[serde(default = "default_max_combined_price")]
    pub max_combined_price: Decimal,

    /// Price cushion added per leg to improve fill probability.
    #[serde(default = "default_slippage_buffer")]
    pub slippage_buffer: Decimal,

    // === Sizing ===
    /// Maximum capital committed per market position (USD).
    #[serde(default = "default_max_position_usd")]
    pub max_position_usd: Decimal,

    /// Minimum notional per leg (USD).
    #[serde(default = "default_min_order_usd")]
    pub min_order_usd: Decimal,

    /// Maximum notional per order (USD).
    #[serde(default = "default_max_order_usd")]
    pub max_order_usd: Decimal,

    // === Imbalance admission ===
    /// Steady-state max ratio of larger side to smaller side.
    #[serde(default = "default_steady_imbalance_ratio")]
    pub steady_imbalance_ratio: Decimal,

    /// Max ratio during the rebalancing window.
    #[serde(default = "default_rebalance_imbalance_ratio")]
    pub rebalance_imbalance_ratio: Decimal,

    /// Max ratio during the bootstrap window right after market start.
    #[serde(default = "default_bootstrap_imbalance_ratio")]
    pub bootstrap_imbalance_ratio: Decimal,

    /// End of the bootstrap window, minutes from market start.
    #[serde(default = "default_bootstrap_window_minutes")]
    pub bootstrap_window_minutes: Decimal,

    /// End of the rebalancing window, minutes from market start.
    #[serde(default = "default_rebalance_window_minutes")]
    pub rebalance_window_minutes: Decimal,

    // === Execution ===
    /// Per-leg submission timeout in milliseconds.
    #[serde(default = "default_submission_timeout_ms")]
    pub submission_timeout_ms: u64,

    /// Hard trading cutoff before the resolution deadline, in seconds.
    #[serde(default = "default_trading_cutoff_secs")]
    pub trading_cutoff_secs: i64,

    // === Telemetry ===
    /// Bounded telemetry channel capacity; events are dropped when full.
    #[serde(default = "default_telemetry_buffer")]
    pub telemetry_buffer: usize,
}

fn default_max_combined_price() -> Decimal {
    Decimal::new(97, 2) // 0.97
}

fn default_slippage_buffer() -> Decimal {
    Decimal::new(2, 2) // 0.02 per leg
}

fn default_max_position_usd() -> Decimal {
    Decimal::new(100, 0)
}

fn default_min_order_usd() -> Decimal {
    Decimal::new(5, 0)
}

fn default_max_order_usd() -> Decimal {
    Decimal::new(25, 0)
}

fn default_steady_imbalance_ratio() -> Decimal {
    Decimal::new(13, 1) // 1.3
}

fn default_rebalance_imbalance_ratio() -> Decimal {
    Decimal::new(3, 0)
}

fn default_bootstrap_imbalance_ratio() -> Decimal {
    Decimal::new(12, 0)
}

fn default_bootstrap_window_minutes() -> Decimal {
    Decimal::ONE
}

fn default_rebalance_window_minutes() -> Decimal {
    Decimal::TWO
}

fn default_submission_timeout_ms() -> u64 {
    3000
}

fn default_trading_cutoff_secs() -> i64 {
    30
}

fn default_telemetry_buffer() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_combined_price: default_max_combined_price(),
            slippage_buffer: default_slippage_buffer(),
            max_position_usd: default_max_position_usd(),
            min_order_usd: default_min_order_usd(),
            max_order_usd: default_max_order_usd(),
            steady_imbalance_ratio: default_steady_imbalance_ratio(),
            rebalance_imbalance_ratio: default_rebalance_imbalance_ratio(),
            bootstrap_imbalance_ratio: default_bootstrap_imbalance_ratio(),
            bootstrap_window_minutes: default_bootstrap_window_minutes(),
            rebalance_window_minutes: default_rebalance_window_minutes(),
            submission_timeout_ms: default_submission_timeout_ms(),
            trading_cutoff_secs: default_trading_cutoff_secs(),
            telemetry_buffer: default_telemetry_buffer(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_combined_price <= Decimal::ZERO || self.max_combined_price >= Decimal::ONE {
            return Err("MAX_COMBINED_PRICE must be in (0, 1)".to_string());
        }

        if self.slippage_buffer < Decimal::ZERO {
            return Err("SLIPPAGE_BUFFER must be non-negative".to_string());
        }

        if self.min_order_usd > self.max_order_usd {
            return Err("MIN_ORDER_USD must not exceed MAX_ORDER_USD".to_string());
        }

        if self.max_position_usd <= Decimal::ZERO {
            return Err("MAX_POSITION_USD must be positive".to_string());
        }

        if self.steady_imbalance_ratio < Decimal::ONE
            || self.rebalance_imbalance_ratio < Decimal::ONE
            || self.bootstrap_imbalance_ratio < Decimal::ONE
        {
            return Err("imbalance ratios must be at least 1.0".to_string());
        }

        if self.bootstrap_window_minutes >= self.rebalance_window_minutes {
            return Err(
                "BOOTSTRAP_WINDOW_MINUTES must be less than REBALANCE_WINDOW_MINUTES".to_string(),
            );
        }

        if self.submission_timeout_ms == 0 {
            return Err("SUBMISSION_TIMEOUT_MS must be positive".to_string());
        }

        if self.trading_cutoff_secs < 0 {
            return Err("TRADING_CUTOFF_SECS must be non-negative".to_string());
        }

        Ok(())
    }

    /// Per-leg submission timeout as a [`Duration`].
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_millis(self.submission_timeout_ms)
    }

    /// Effective raw-price ceiling after subtracting both slippage buffers.
    pub fn effective_raw_ceiling(&self) -> Decimal {
        self.max_combined_price - self.slippage_buffer * Decimal::TWO
    }
}
