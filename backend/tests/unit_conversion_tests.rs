//! Unit conversion tests
//!
//! Covers the conversion engine the stock service normalizes every input
//! quantity with: recognized units, kind compatibility, fixed factors,
//! rounding, and round-trip stability.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::units::{convert, is_valid_unit, parse_unit, Unit, UnitError, UnitKind};

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

    /// All supported unit spellings parse
    #[test]
    fn test_recognized_units() {
        for spelling in ["g", "kg", "ml", "l", "pcs", "piece", "box"] {
            assert!(is_valid_unit(spelling), "{} should be recognized", spelling);
        }
    }

    /// Parsing ignores case and surrounding whitespace
    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_unit("KG").unwrap(), Unit::Kilogram);
        assert_eq!(parse_unit(" Ml ").unwrap(), Unit::Millilitre);
    }

    /// Unknown units are rejected, not guessed
    #[test]
    fn test_unknown_units_rejected() {
        for spelling in ["oz", "lb", "gallon", "", "grams"] {
            assert!(matches!(
                parse_unit(spelling),
                Err(UnitError::Unsupported(_))
            ));
        }
    }

    /// Unit families
    #[test]
    fn test_unit_kinds() {
        assert_eq!(Unit::Gram.kind(), UnitKind::Weight);
        assert_eq!(Unit::Kilogram.kind(), UnitKind::Weight);
        assert_eq!(Unit::Millilitre.kind(), UnitKind::Volume);
        assert_eq!(Unit::Litre.kind(), UnitKind::Volume);
        assert_eq!(Unit::Pcs.kind(), UnitKind::Pieces);
        assert_eq!(Unit::Piece.kind(), UnitKind::Pieces);
        assert_eq!(Unit::Box.kind(), UnitKind::Pieces);
    }

    /// Identity conversion returns the input untouched
    #[test]
    fn test_identity_conversion() {
        assert_eq!(convert(dec("0.1234"), Unit::Gram, Unit::Gram).unwrap(), dec("0.1234"));
        assert_eq!(convert(dec("7"), Unit::Pcs, Unit::Pcs).unwrap(), dec("7"));
    }

    /// Fixed factors for weight and volume
    #[test]
    fn test_fixed_factors() {
        assert_eq!(convert(dec("2.5"), Unit::Kilogram, Unit::Gram).unwrap(), dec("2500"));
        assert_eq!(convert(dec("500"), Unit::Gram, Unit::Kilogram).unwrap(), dec("0.5"));
        assert_eq!(convert(dec("0.75"), Unit::Litre, Unit::Millilitre).unwrap(), dec("750"));
        assert_eq!(convert(dec("1250"), Unit::Millilitre, Unit::Litre).unwrap(), dec("1.25"));
    }

    /// Cross-kind conversion is rejected, never coerced
    #[test]
    fn test_cross_kind_rejected() {
        assert_eq!(
            convert(dec("5"), Unit::Kilogram, Unit::Millilitre),
            Err(UnitError::Incompatible { from: Unit::Kilogram, to: Unit::Millilitre })
        );
        assert!(convert(dec("5"), Unit::Litre, Unit::Kilogram).is_err());
        assert!(convert(dec("5"), Unit::Box, Unit::Millilitre).is_err());
        assert!(convert(dec("5"), Unit::Gram, Unit::Pcs).is_err());
    }

    /// Piece units are distinct nominal units: no pcs/piece/box conversion
    #[test]
    fn test_piece_units_are_nominal() {
        assert!(convert(dec("1"), Unit::Box, Unit::Piece).is_err());
        assert!(convert(dec("1"), Unit::Piece, Unit::Pcs).is_err());
        assert!(convert(dec("1"), Unit::Pcs, Unit::Box).is_err());
    }

    /// Results are rounded to four decimal places
    #[test]
    fn test_rounding() {
        assert_eq!(
            convert(dec("0.77777"), Unit::Gram, Unit::Kilogram).unwrap(),
            dec("0.0008")
        );
        assert_eq!(
            convert(dec("1.00004"), Unit::Millilitre, Unit::Litre).unwrap(),
            dec("0.0010")
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for quantities with at most four decimal places
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000_000i64).prop_map(|n| Decimal::new(n, 4)) // 0.0001 to 10000.0000
    }

    fn weight_unit_strategy() -> impl Strategy<Value = Unit> {
        prop_oneof![Just(Unit::Gram), Just(Unit::Kilogram)]
    }

    fn volume_unit_strategy() -> impl Strategy<Value = Unit> {
        prop_oneof![Just(Unit::Millilitre), Just(Unit::Litre)]
    }

    fn piece_unit_strategy() -> impl Strategy<Value = Unit> {
        prop_oneof![Just(Unit::Pcs), Just(Unit::Piece), Just(Unit::Box)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// kg -> g -> kg reproduces the input for quantities at ledger scale
        #[test]
        fn prop_weight_round_trip(quantity in quantity_strategy()) {
            let grams = convert(quantity, Unit::Kilogram, Unit::Gram).unwrap();
            let back = convert(grams, Unit::Gram, Unit::Kilogram).unwrap();
            prop_assert_eq!(back, quantity.round_dp(4));
        }

        /// l -> ml -> l reproduces the input for quantities at ledger scale
        #[test]
        fn prop_volume_round_trip(quantity in quantity_strategy()) {
            let ml = convert(quantity, Unit::Litre, Unit::Millilitre).unwrap();
            let back = convert(ml, Unit::Millilitre, Unit::Litre).unwrap();
            prop_assert_eq!(back, quantity.round_dp(4));
        }

        /// Weight and volume never convert into each other
        #[test]
        fn prop_weight_volume_always_rejected(
            quantity in quantity_strategy(),
            from in weight_unit_strategy(),
            to in volume_unit_strategy()
        ) {
            prop_assert!(convert(quantity, from, to).is_err());
            prop_assert!(convert(quantity, to, from).is_err());
        }

        /// Distinct piece units never convert into each other
        #[test]
        fn prop_distinct_piece_units_rejected(
            quantity in quantity_strategy(),
            from in piece_unit_strategy(),
            to in piece_unit_strategy()
        ) {
            let result = convert(quantity, from, to);
            if from == to {
                prop_assert_eq!(result.unwrap(), quantity);
            } else {
                prop_assert!(result.is_err());
            }
        }

        /// Scaling up into the base unit multiplies by exactly 1000
        #[test]
        fn prop_scale_up_factor(quantity in quantity_strategy()) {
            let grams = convert(quantity, Unit::Kilogram, Unit::Gram).unwrap();
            prop_assert_eq!(grams, (quantity * Decimal::from(1000)).round_dp(4));
            prop_assert!(grams > Decimal::ZERO);
        }
    }
}
