//! Stock alert tests
//!
//! Covers the alert slot decision logic: when low-stock and out-of-stock
//! alerts are raised, how the slot moves between states across a sequence
//! of mutations, and why manual resolution does not suppress re-creation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ledger::{alert_for, apply_delta};
use shared::models::AlertType;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// The alert slot for one (branch, item) pair: at most one open alert,
/// replaced on every re-evaluation. Mirrors what the alert manager does
/// against the database.
#[derive(Debug, Default)]
struct AlertSlot {
    open: Option<AlertType>,
    resolved_count: usize,
}

impl AlertSlot {
    /// Re-evaluate the slot against a fresh snapshot quantity
    fn reevaluate(&mut self, current: Decimal, min_level: Option<Decimal>) {
        if self.open.take().is_some() {
            self.resolved_count += 1;
        }
        self.open = alert_for(current, min_level);
    }

    /// Manual staff acknowledgement
    fn resolve_manually(&mut self) {
        if self.open.take().is_some() {
            self.resolved_count += 1;
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Quantity above the threshold warrants no alert
    #[test]
    fn test_no_alert_above_threshold() {
        assert_eq!(alert_for(dec("20"), Some(dec("10"))), None);
    }

    /// Quantity at or below the threshold warrants a low-stock alert
    #[test]
    fn test_low_stock_at_threshold() {
        assert_eq!(alert_for(dec("10"), Some(dec("10"))), Some(AlertType::LowStock));
        assert_eq!(alert_for(dec("5"), Some(dec("10"))), Some(AlertType::LowStock));
    }

    /// Zero quantity warrants out-of-stock, with or without a threshold
    #[test]
    fn test_out_of_stock_at_zero() {
        assert_eq!(alert_for(Decimal::ZERO, Some(dec("10"))), Some(AlertType::OutOfStock));
        assert_eq!(alert_for(Decimal::ZERO, None), Some(AlertType::OutOfStock));
    }

    /// Items without a minimum level never raise low-stock alerts
    #[test]
    fn test_no_threshold_no_low_stock() {
        assert_eq!(alert_for(dec("0.0001"), None), None);
    }

    /// The full lifecycle: 20 -> 5 (low) -> 0 (out) -> 20 (clear).
    /// Each qualifying state replaces the prior alert; recovery leaves the
    /// slot empty with both earlier alerts resolved.
    #[test]
    fn test_alert_lifecycle() {
        let min_level = Some(dec("10"));
        let mut slot = AlertSlot::default();
        let mut quantity = dec("20");

        // Stock out 15 of 20 -> low stock at 5
        quantity = apply_delta(quantity, dec("-15")).unwrap();
        slot.reevaluate(quantity, min_level);
        assert_eq!(slot.open, Some(AlertType::LowStock));
        assert_eq!(slot.resolved_count, 0);

        // Stock out the remaining 5 -> out of stock replaces low stock
        quantity = apply_delta(quantity, dec("-5")).unwrap();
        slot.reevaluate(quantity, min_level);
        assert_eq!(slot.open, Some(AlertType::OutOfStock));
        assert_eq!(slot.resolved_count, 1);

        // Restock 20 -> slot cleared, nothing new raised
        quantity = apply_delta(quantity, dec("20")).unwrap();
        slot.reevaluate(quantity, min_level);
        assert_eq!(slot.open, None);
        assert_eq!(slot.resolved_count, 2);
    }

    /// Manual resolution acknowledges the alert but the next mutation
    /// re-raises it while the condition still holds
    #[test]
    fn test_manual_resolution_does_not_suppress() {
        let min_level = Some(dec("10"));
        let mut slot = AlertSlot::default();

        slot.reevaluate(dec("5"), min_level);
        assert_eq!(slot.open, Some(AlertType::LowStock));

        // Staff acknowledges without restocking
        slot.resolve_manually();
        assert_eq!(slot.open, None);

        // Next mutation still finds the quantity low
        slot.reevaluate(dec("4"), min_level);
        assert_eq!(slot.open, Some(AlertType::LowStock));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.0 to 1000.0
    }

    fn threshold_strategy() -> impl Strategy<Value = Option<Decimal>> {
        prop_oneof![
            Just(None),
            (1i64..=5000i64).prop_map(|n| Some(Decimal::new(n, 1))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The alert decision matches the threshold rules exactly
        #[test]
        fn prop_alert_decision_correct(
            quantity in quantity_strategy(),
            min_level in threshold_strategy()
        ) {
            let decision = alert_for(quantity, min_level);
            if quantity.is_zero() {
                prop_assert_eq!(decision, Some(AlertType::OutOfStock));
            } else if let Some(min) = min_level {
                if quantity <= min {
                    prop_assert_eq!(decision, Some(AlertType::LowStock));
                } else {
                    prop_assert_eq!(decision, None);
                }
            } else {
                prop_assert_eq!(decision, None);
            }
        }

        /// The slot never holds more than one open alert across any sequence
        #[test]
        fn prop_at_most_one_open_alert(
            quantities in prop::collection::vec(quantity_strategy(), 1..30),
            min_level in threshold_strategy()
        ) {
            let mut slot = AlertSlot::default();
            for quantity in quantities {
                slot.reevaluate(quantity, min_level);
                // Option<AlertType> models the at-most-one invariant; the
                // open alert always reflects the latest quantity
                prop_assert_eq!(slot.open, alert_for(quantity, min_level));
            }
        }

        /// Recovery above the threshold always clears the slot
        #[test]
        fn prop_recovery_clears_slot(
            min in (1i64..=5000i64).prop_map(|n| Decimal::new(n, 1)),
            surplus in (1i64..=5000i64).prop_map(|n| Decimal::new(n, 1))
        ) {
            let mut slot = AlertSlot::default();
            slot.reevaluate(Decimal::ZERO, Some(min));
            prop_assert_eq!(slot.open, Some(AlertType::OutOfStock));

            slot.reevaluate(min + surplus, Some(min));
            prop_assert_eq!(slot.open, None);
        }
    }
}
