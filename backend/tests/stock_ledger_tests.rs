//! Stock ledger tests
//!
//! Covers the ledger math every mutation runs through: the negative-stock
//! guard, snapshot-equals-replay, reservation bounds, the per-item order
//! deduction policy, and the exactly-one-winner behavior of two concurrent
//! stock-outs racing on the same (branch, item) key.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ledger::{apply_delta, release, replay, reserve, stock_status};
use shared::models::StockStatus;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Stock-in adds to the snapshot
    #[test]
    fn test_stock_in_adds() {
        assert_eq!(apply_delta(dec("100"), dec("50")).unwrap(), dec("150"));
    }

    /// Stock-out subtracts from the snapshot
    #[test]
    fn test_stock_out_subtracts() {
        assert_eq!(apply_delta(dec("100"), dec("-30")).unwrap(), dec("70"));
    }

    /// Draining the snapshot to exactly zero is allowed
    #[test]
    fn test_drain_to_zero() {
        assert_eq!(apply_delta(dec("12.5"), dec("-12.5")).unwrap(), Decimal::ZERO);
    }

    /// The negative-stock guard: a rejected movement leaves the quantity alone
    #[test]
    fn test_negative_stock_guard() {
        let current = dec("5");
        let result = apply_delta(current, dec("-6"));
        assert!(result.is_err());
        // The caller keeps the unchanged snapshot
        assert_eq!(current, dec("5"));
    }

    /// Replaying a ledger reproduces the running snapshot
    #[test]
    fn test_replay_reproduces_snapshot() {
        let deltas = vec![dec("50"), dec("30"), dec("-20"), dec("10"), dec("-15")];

        let mut snapshot = Decimal::ZERO;
        for delta in &deltas {
            snapshot = apply_delta(snapshot, *delta).unwrap();
        }

        assert_eq!(replay(deltas), snapshot);
        assert_eq!(snapshot, dec("55"));
    }

    /// Status thresholds against the minimum level
    #[test]
    fn test_stock_status() {
        assert_eq!(stock_status(dec("20"), Some(dec("10"))), StockStatus::Sufficient);
        assert_eq!(stock_status(dec("10"), Some(dec("10"))), StockStatus::Low);
        assert_eq!(stock_status(dec("9.9999"), Some(dec("10"))), StockStatus::Low);
        assert_eq!(stock_status(Decimal::ZERO, Some(dec("10"))), StockStatus::OutOfStock);
        // No threshold configured: only zero is flagged
        assert_eq!(stock_status(dec("0.0001"), None), StockStatus::Sufficient);
        assert_eq!(stock_status(Decimal::ZERO, None), StockStatus::OutOfStock);
    }

    /// Reservations never exceed what is on hand
    #[test]
    fn test_reservation_bounds() {
        assert_eq!(reserve(dec("10"), dec("0"), dec("10")).unwrap(), dec("10"));
        assert!(reserve(dec("10"), dec("4"), dec("7")).is_err());
        assert_eq!(release(dec("4"), dec("4")).unwrap(), Decimal::ZERO);
        assert!(release(dec("4"), dec("5")).is_err());
    }

    /// Per-item order deduction: one short item does not undo the others
    #[test]
    fn test_partial_order_deduction() {
        // (item stock, requested) for two order lines
        let mut stocks = vec![dec("100"), dec("3")];
        let requests = vec![dec("40"), dec("5")];

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (idx, requested) in requests.iter().enumerate() {
            match apply_delta(stocks[idx], -requested) {
                Ok(next) => {
                    stocks[idx] = next;
                    succeeded.push(idx);
                }
                Err(_) => failed.push(idx),
            }
        }

        assert_eq!(succeeded, vec![0]);
        assert_eq!(failed, vec![1]);
        // The first deduction stays committed, the second left untouched
        assert_eq!(stocks[0], dec("60"));
        assert_eq!(stocks[1], dec("3"));
    }
}

// ============================================================================
// Concurrency
// ============================================================================

#[cfg(test)]
mod concurrency_tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Two concurrent stock-outs of 3 against a quantity of 5: the per-key
    /// lock admits exactly one of them, and the snapshot ends at 2, never -1.
    #[tokio::test]
    async fn test_concurrent_stock_out_single_winner() {
        // Stand-in for the database row lock on one (branch, item) pair
        let snapshot = Arc::new(Mutex::new(dec("5")));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let snapshot = Arc::clone(&snapshot);
            handles.push(tokio::spawn(async move {
                let mut quantity = snapshot.lock().await;
                match apply_delta(*quantity, dec("-3")) {
                    Ok(next) => {
                        *quantity = next;
                        true
                    }
                    Err(_) => false,
                }
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(*snapshot.lock().await, dec("2"));
    }

    /// Many concurrent stock-outs can never drive the snapshot negative
    #[tokio::test]
    async fn test_concurrent_stock_out_never_negative() {
        let snapshot = Arc::new(Mutex::new(dec("10")));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let snapshot = Arc::clone(&snapshot);
            handles.push(tokio::spawn(async move {
                let mut quantity = snapshot.lock().await;
                if let Ok(next) = apply_delta(*quantity, dec("-3")) {
                    *quantity = next;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let final_quantity = *snapshot.lock().await;
        // 3 of the 8 deductions fit into 10
        assert_eq!(final_quantity, dec("1"));
        assert!(final_quantity >= Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for positive movement quantities
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// Strategy for signed movement deltas
    fn delta_strategy() -> impl Strategy<Value = Decimal> {
        (any::<bool>(), quantity_strategy())
            .prop_map(|(inbound, qty)| if inbound { qty } else { -qty })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The snapshot never goes negative, whatever sequence is thrown at it
        #[test]
        fn prop_snapshot_never_negative(
            deltas in prop::collection::vec(delta_strategy(), 1..40)
        ) {
            let mut snapshot = Decimal::ZERO;
            for delta in deltas {
                if let Ok(next) = apply_delta(snapshot, delta) {
                    snapshot = next;
                }
                prop_assert!(snapshot >= Decimal::ZERO);
            }
        }

        /// Replaying exactly the applied movements reproduces the snapshot
        #[test]
        fn prop_replay_equals_snapshot(
            deltas in prop::collection::vec(delta_strategy(), 1..40)
        ) {
            let mut snapshot = Decimal::ZERO;
            let mut applied = Vec::new();

            // Rejected movements never enter the ledger
            for delta in deltas {
                if let Ok(next) = apply_delta(snapshot, delta) {
                    snapshot = next;
                    applied.push(delta);
                }
            }

            prop_assert_eq!(replay(applied), snapshot);
        }

        /// A rejected stock-out is exactly the case that would overdraw
        #[test]
        fn prop_rejection_iff_overdraw(
            current in quantity_strategy(),
            requested in quantity_strategy()
        ) {
            let result = apply_delta(current, -requested);
            if requested > current {
                prop_assert!(result.is_err());
            } else {
                prop_assert_eq!(result.unwrap(), current - requested);
            }
        }

        /// Reserved quantity stays within [0, current]
        #[test]
        fn prop_reservation_bounds(
            current in quantity_strategy(),
            holds in prop::collection::vec(quantity_strategy(), 1..20)
        ) {
            let mut reserved = Decimal::ZERO;
            for hold in holds {
                if let Ok(next) = reserve(current, reserved, hold) {
                    reserved = next;
                }
                prop_assert!(reserved >= Decimal::ZERO);
                prop_assert!(reserved <= current);
            }
        }
    }
}
