//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `bank_accounts_created_total` - Accounts opened
//! - `bank_deposits_total` - Deposits applied
//! - `bank_withdrawals_total` - Withdrawals applied
//! - `bank_transfers_total` - Transfers completed (both legs)
//! - `bank_rejected_operations_total` - Transaction requests rejected by any check

use prometheus::{IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accounts opened
    pub accounts_created: IntCounter,

    /// Deposits applied
    pub deposits: IntCounter,

    /// Withdrawals applied
    pub withdrawals: IntCounter,

    /// Transfers completed
    pub transfers: IntCounter,

    /// Rejected transaction requests (unauthorized, insufficient funds, ...)
    pub rejected: IntCounter,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let accounts_created =
            IntCounter::new("bank_accounts_created_total", "Accounts opened")?;
        registry.register(Box::new(accounts_created.clone()))?;

        let deposits = IntCounter::new("bank_deposits_total", "Deposits applied")?;
        registry.register(Box::new(deposits.clone()))?;

        let withdrawals = IntCounter::new("bank_withdrawals_total", "Withdrawals applied")?;
        registry.register(Box::new(withdrawals.clone()))?;

        let transfers = IntCounter::new("bank_transfers_total", "Transfers completed")?;
        registry.register(Box::new(transfers.clone()))?;

        let rejected = IntCounter::new(
            "bank_rejected_operations_total",
            "Transaction requests rejected by any check",
        )?;
        registry.register(Box::new(rejected.clone()))?;

        Ok(Self {
            accounts_created,
            deposits,
            withdrawals,
            transfers,
            rejected,
            registry,
        })
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        // A fresh registry with static metric names cannot collide
        Self::new().unwrap_or_else(|e| panic!("Failed to create metrics: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.deposits.get(), 0);
        assert_eq!(metrics.rejected.get(), 0);
    }

    #[test]
    fn test_counters_increment() {
        let metrics = Metrics::new().unwrap();
        metrics.deposits.inc();
        metrics.deposits.inc();
        metrics.transfers.inc();
        assert_eq!(metrics.deposits.get(), 2);
        assert_eq!(metrics.transfers.get(), 1);
    }

    #[test]
    fn test_independent_registries() {
        // Two collectors must not collide on metric names.
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.withdrawals.inc();
        assert_eq!(b.withdrawals.get(), 0);
    }
}
