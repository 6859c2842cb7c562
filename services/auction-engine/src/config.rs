//! Engine configuration

use rust_decimal::Decimal;
use types::money::Money;

/// Tunables for the hub, cascade and finalizer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bids included in the snapshot pushed on join.
    pub snapshot_recent_bids: usize,
    /// Maximum overdue auctions processed per sweep tick; the rest are
    /// picked up on subsequent ticks.
    pub finalize_batch_size: usize,
    /// Minimum increment over the current bid for proxy bids.
    pub min_increment: Money,
    /// Tax rate applied to settlement orders.
    pub tax_rate: Decimal,
    /// Interval between finalizer sweeps in the service binary.
    pub sweep_interval_secs: u64,
    /// Advisory ending-soon horizon.
    pub ending_soon_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_recent_bids: 10,
            finalize_batch_size: 50,
            min_increment: Money::from_u64(100),
            tax_rate: Decimal::new(18, 2),
            sweep_interval_secs: 30,
            ending_soon_minutes: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.snapshot_recent_bids, 10);
        assert_eq!(config.finalize_batch_size, 50);
        assert_eq!(config.tax_rate, Decimal::from_str("0.18").unwrap());
    }
}
