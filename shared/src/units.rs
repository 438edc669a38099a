//! Unit conversion for stock quantities
//!
//! Pure, deterministic conversion between compatible measurement units.
//! Every quantity is normalized to its item's storage unit before it
//! touches the stock ledger, so conversion failures surface before any
//! state is changed.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept after a conversion
pub const QUANTITY_SCALE: u32 = 4;

/// Measurement units accepted on stock inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "ml")]
    Millilitre,
    #[serde(rename = "l")]
    Litre,
    #[serde(rename = "pcs")]
    Pcs,
    #[serde(rename = "piece")]
    Piece,
    #[serde(rename = "box")]
    Box,
}

/// Families of mutually convertible units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Weight,
    Volume,
    Pieces,
}

/// Conversion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Unsupported unit: {0}")]
    Unsupported(String),
    #[error("Incompatible units: {from} -> {to}")]
    Incompatible { from: Unit, to: Unit },
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Millilitre => "ml",
            Unit::Litre => "l",
            Unit::Pcs => "pcs",
            Unit::Piece => "piece",
            Unit::Box => "box",
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Gram | Unit::Kilogram => UnitKind::Weight,
            Unit::Millilitre | Unit::Litre => UnitKind::Volume,
            Unit::Pcs | Unit::Piece | Unit::Box => UnitKind::Pieces,
        }
    }

    /// Multiplier into the base unit of the family (g for weight, ml for volume).
    /// Piece units have no base: they never cross-convert.
    fn base_factor(&self) -> Decimal {
        match self {
            Unit::Gram | Unit::Millilitre => Decimal::ONE,
            Unit::Kilogram | Unit::Litre => Decimal::from(1000),
            Unit::Pcs | Unit::Piece | Unit::Box => Decimal::ONE,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" => Ok(Unit::Gram),
            "kg" => Ok(Unit::Kilogram),
            "ml" => Ok(Unit::Millilitre),
            "l" => Ok(Unit::Litre),
            "pcs" => Ok(Unit::Pcs),
            "piece" => Ok(Unit::Piece),
            "box" => Ok(Unit::Box),
            other => Err(UnitError::Unsupported(other.to_string())),
        }
    }
}

/// Parse a unit string from an API input
pub fn parse_unit(s: &str) -> Result<Unit, UnitError> {
    Unit::from_str(s)
}

/// Whether a unit string is recognized at all
pub fn is_valid_unit(s: &str) -> bool {
    Unit::from_str(s).is_ok()
}

/// Convert a quantity between two units.
///
/// Identity conversions are returned untouched. Weight and volume units
/// convert through their fixed base factor and are rounded to
/// [`QUANTITY_SCALE`] places. Piece units (pcs, piece, box) are distinct
/// nominal units and never convert into each other; expanding a box into
/// pieces needs an explicit catalog rule, which this module does not own.
pub fn convert(quantity: Decimal, from: Unit, to: Unit) -> Result<Decimal, UnitError> {
    if from == to {
        return Ok(quantity);
    }

    if from.kind() != to.kind() || from.kind() == UnitKind::Pieces {
        return Err(UnitError::Incompatible { from, to });
    }

    let converted = quantity * from.base_factor() / to.base_factor();
    Ok(converted.round_dp(QUANTITY_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_known_units() {
        assert_eq!(parse_unit("g").unwrap(), Unit::Gram);
        assert_eq!(parse_unit("KG").unwrap(), Unit::Kilogram);
        assert_eq!(parse_unit(" ml ").unwrap(), Unit::Millilitre);
        assert_eq!(parse_unit("l").unwrap(), Unit::Litre);
        assert_eq!(parse_unit("pcs").unwrap(), Unit::Pcs);
        assert_eq!(parse_unit("piece").unwrap(), Unit::Piece);
        assert_eq!(parse_unit("box").unwrap(), Unit::Box);
    }

    #[test]
    fn test_parse_unknown_unit() {
        assert!(matches!(parse_unit("oz"), Err(UnitError::Unsupported(_))));
        assert!(!is_valid_unit("gallon"));
        assert!(is_valid_unit("kg"));
    }

    #[test]
    fn test_unit_kinds() {
        assert_eq!(Unit::Gram.kind(), UnitKind::Weight);
        assert_eq!(Unit::Kilogram.kind(), UnitKind::Weight);
        assert_eq!(Unit::Millilitre.kind(), UnitKind::Volume);
        assert_eq!(Unit::Litre.kind(), UnitKind::Volume);
        assert_eq!(Unit::Pcs.kind(), UnitKind::Pieces);
        assert_eq!(Unit::Box.kind(), UnitKind::Pieces);
    }

    #[test]
    fn test_identity_conversion() {
        assert_eq!(convert(dec("12.5"), Unit::Gram, Unit::Gram).unwrap(), dec("12.5"));
        assert_eq!(convert(dec("3"), Unit::Box, Unit::Box).unwrap(), dec("3"));
    }

    #[test]
    fn test_weight_conversion() {
        assert_eq!(convert(dec("2"), Unit::Kilogram, Unit::Gram).unwrap(), dec("2000"));
        assert_eq!(convert(dec("250"), Unit::Gram, Unit::Kilogram).unwrap(), dec("0.25"));
    }

    #[test]
    fn test_volume_conversion() {
        assert_eq!(convert(dec("1.5"), Unit::Litre, Unit::Millilitre).unwrap(), dec("1500"));
        assert_eq!(convert(dec("330"), Unit::Millilitre, Unit::Litre).unwrap(), dec("0.33"));
    }

    #[test]
    fn test_rounding_to_scale() {
        // 1 g = 0.001 kg; a third of a gram rounds at 4 places
        let converted = convert(dec("0.3333333"), Unit::Gram, Unit::Kilogram).unwrap();
        assert_eq!(converted, dec("0.0003"));
    }

    #[test]
    fn test_incompatible_kinds_rejected() {
        assert_eq!(
            convert(dec("5"), Unit::Kilogram, Unit::Millilitre),
            Err(UnitError::Incompatible { from: Unit::Kilogram, to: Unit::Millilitre })
        );
        assert!(convert(dec("5"), Unit::Litre, Unit::Gram).is_err());
        assert!(convert(dec("5"), Unit::Pcs, Unit::Gram).is_err());
    }

    #[test]
    fn test_piece_units_never_cross_convert() {
        assert_eq!(
            convert(dec("2"), Unit::Box, Unit::Piece),
            Err(UnitError::Incompatible { from: Unit::Box, to: Unit::Piece })
        );
        assert!(convert(dec("2"), Unit::Pcs, Unit::Piece).is_err());
        assert!(convert(dec("2"), Unit::Piece, Unit::Box).is_err());
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let original = dec("7.4321");
        let grams = convert(original, Unit::Kilogram, Unit::Gram).unwrap();
        let back = convert(grams, Unit::Gram, Unit::Kilogram).unwrap();
        assert_eq!(back, original);
    }
}
