//! Raw-item catalog models
//!
//! Catalog entries describe the ingredients and supplies a branch keeps in
//! stock. The stock engine reads them for the storage unit and thresholds;
//! it never mutates them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::units::Unit;

/// Catalog category of a raw item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Ingredient,
    Packaging,
    Equipment,
    Consumable,
    Other,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Ingredient => "ingredient",
            ItemCategory::Packaging => "packaging",
            ItemCategory::Equipment => "equipment",
            ItemCategory::Consumable => "consumable",
            ItemCategory::Other => "other",
        }
    }
}

/// Canonical unit an item's quantity is persisted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "storage_unit", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StorageUnit {
    Gram,
    Millilitre,
    Piece,
}

impl StorageUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageUnit::Gram => "gram",
            StorageUnit::Millilitre => "millilitre",
            StorageUnit::Piece => "piece",
        }
    }

    /// The measurement unit this storage unit corresponds to
    pub fn unit(&self) -> Unit {
        match self {
            StorageUnit::Gram => Unit::Gram,
            StorageUnit::Millilitre => Unit::Millilitre,
            StorageUnit::Piece => Unit::Piece,
        }
    }
}

/// A raw ingredient or supply in the catalog
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RawItem {
    pub id: Uuid,
    /// Unique human-readable SKU, e.g. "MILK-FRESH"
    pub code: String,
    pub name: String,
    pub name_th: Option<String>,
    pub category: ItemCategory,
    pub storage_unit: StorageUnit,
    /// Cost per one storage unit
    pub unit_cost: Decimal,
    /// Low-stock threshold in storage units
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
