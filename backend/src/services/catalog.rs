//! Raw-item catalog service
//!
//! Manages the catalog entries the stock engine tracks quantities for. The
//! engine itself only reads these rows; all catalog writes go through here.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::models::{ItemCategory, RawItem, StorageUnit};
use shared::validation;

use crate::error::{AppError, AppResult};

/// Columns returned for every raw-item query
const RAW_ITEM_COLUMNS: &str = "id, code, name, name_th, category, storage_unit, unit_cost, \
                                min_stock_level, max_stock_level, is_active, created_at, updated_at";

/// Catalog service for managing raw items
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Input for creating a raw item
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRawItemInput {
    #[validate(length(min = 3, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub name_th: Option<String>,
    pub category: ItemCategory,
    pub storage_unit: StorageUnit,
    pub unit_cost: Decimal,
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
}

/// Input for updating a raw item (all fields optional)
#[derive(Debug, Deserialize)]
pub struct UpdateRawItemInput {
    pub name: Option<String>,
    pub name_th: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub min_stock_level: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a raw item
    pub async fn create_item(&self, input: CreateRawItemInput) -> AppResult<RawItem> {
        input.validate().map_err(|e| AppError::Validation {
            field: e
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_default(),
            message: "Invalid raw item input".to_string(),
            message_th: "ข้อมูลสินค้าไม่ถูกต้อง".to_string(),
        })?;

        validation::validate_item_code(&input.code).map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
            message_th: "รหัสสินค้าไม่ถูกต้อง".to_string(),
        })?;

        validation::validate_unit_cost(input.unit_cost).map_err(|msg| AppError::Validation {
            field: "unit_cost".to_string(),
            message: msg.to_string(),
            message_th: "ต้นทุนต่อหน่วยไม่ถูกต้อง".to_string(),
        })?;

        validation::validate_stock_levels(input.min_stock_level, input.max_stock_level).map_err(
            |msg| AppError::Validation {
                field: "min_stock_level/max_stock_level".to_string(),
                message: msg.to_string(),
                message_th: "เกณฑ์สต็อกไม่ถูกต้อง".to_string(),
            },
        )?;

        // Check for duplicate SKU
        let code_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM raw_items WHERE code = $1)",
        )
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;

        if code_exists {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let item = sqlx::query_as::<_, RawItem>(&format!(
            r#"
            INSERT INTO raw_items (
                code, name, name_th, category, storage_unit, unit_cost,
                min_stock_level, max_stock_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RAW_ITEM_COLUMNS}
            "#,
        ))
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.name_th)
        .bind(input.category)
        .bind(input.storage_unit)
        .bind(input.unit_cost)
        .bind(input.min_stock_level)
        .bind(input.max_stock_level)
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    /// Get a raw item by id
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<RawItem> {
        let item = sqlx::query_as::<_, RawItem>(&format!(
            "SELECT {RAW_ITEM_COLUMNS} FROM raw_items WHERE id = $1",
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Raw item".to_string()))?;

        Ok(item)
    }

    /// Get a raw item by its SKU code
    pub async fn get_item_by_code(&self, code: &str) -> AppResult<RawItem> {
        let item = sqlx::query_as::<_, RawItem>(&format!(
            "SELECT {RAW_ITEM_COLUMNS} FROM raw_items WHERE code = $1",
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Raw item".to_string()))?;

        Ok(item)
    }

    /// List raw items, optionally filtered by category
    pub async fn list_items(&self, category: Option<ItemCategory>) -> AppResult<Vec<RawItem>> {
        let items = match category {
            Some(category) => {
                sqlx::query_as::<_, RawItem>(&format!(
                    r#"
                    SELECT {RAW_ITEM_COLUMNS}
                    FROM raw_items
                    WHERE category = $1 AND is_active = true
                    ORDER BY code
                    "#,
                ))
                .bind(category)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, RawItem>(&format!(
                    r#"
                    SELECT {RAW_ITEM_COLUMNS}
                    FROM raw_items
                    WHERE is_active = true
                    ORDER BY code
                    "#,
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(items)
    }

    /// Update a raw item
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateRawItemInput,
    ) -> AppResult<RawItem> {
        let existing = self.get_item(item_id).await?;

        let min_stock_level = input.min_stock_level.or(existing.min_stock_level);
        let max_stock_level = input.max_stock_level.or(existing.max_stock_level);

        validation::validate_stock_levels(min_stock_level, max_stock_level).map_err(|msg| {
            AppError::Validation {
                field: "min_stock_level/max_stock_level".to_string(),
                message: msg.to_string(),
                message_th: "เกณฑ์สต็อกไม่ถูกต้อง".to_string(),
            }
        })?;

        if let Some(cost) = input.unit_cost {
            validation::validate_unit_cost(cost).map_err(|msg| AppError::Validation {
                field: "unit_cost".to_string(),
                message: msg.to_string(),
                message_th: "ต้นทุนต่อหน่วยไม่ถูกต้อง".to_string(),
            })?;
        }

        let item = sqlx::query_as::<_, RawItem>(&format!(
            r#"
            UPDATE raw_items SET
                name = COALESCE($2, name),
                name_th = COALESCE($3, name_th),
                unit_cost = COALESCE($4, unit_cost),
                min_stock_level = COALESCE($5, min_stock_level),
                max_stock_level = COALESCE($6, max_stock_level),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RAW_ITEM_COLUMNS}
            "#,
        ))
        .bind(item_id)
        .bind(&input.name)
        .bind(&input.name_th)
        .bind(input.unit_cost)
        .bind(input.min_stock_level)
        .bind(input.max_stock_level)
        .bind(input.is_active)
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }
}
