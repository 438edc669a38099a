//! HTTP handlers for raw-item catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{ItemCategory, RawItem};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogService, CreateRawItemInput, UpdateRawItemInput};
use crate::AppState;

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub category: Option<ItemCategory>,
}

/// Create a raw item
pub async fn create_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateRawItemInput>,
) -> AppResult<Json<RawItem>> {
    let service = CatalogService::new(state.db);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// List raw items
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<RawItem>>> {
    let service = CatalogService::new(state.db);
    let items = service.list_items(query.category).await?;
    Ok(Json(items))
}

/// Get a raw item by id
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<RawItem>> {
    let service = CatalogService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Update a raw item
pub async fn update_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateRawItemInput>,
) -> AppResult<Json<RawItem>> {
    let service = CatalogService::new(state.db);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}
