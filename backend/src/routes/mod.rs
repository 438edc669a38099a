//! Route definitions for the Cafe Stock Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - raw-item catalog
        .nest("/items", item_routes())
        // Protected routes - stock engine
        .nest("/stock", stock_routes())
        // Protected routes - stock alerts
        .nest("/alerts", alert_routes())
        // Protected routes - notifications
        .nest("/notifications", notification_routes())
}

/// Raw-item catalog routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:item_id",
            get(handlers::get_item).put(handlers::update_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock engine routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        // Movements
        .route("/in", post(handlers::record_stock_in))
        .route("/out", post(handlers::record_stock_out))
        .route("/order-deduction", post(handlers::deduct_from_order))
        // Reservation holds
        .route("/reserve", post(handlers::reserve_stock))
        .route("/release", post(handlers::release_reservation))
        // Levels and history
        .route(
            "/branches/:branch_id/items/:item_id/level",
            get(handlers::get_stock_level),
        )
        .route(
            "/branches/:branch_id/items/:item_id/movements",
            get(handlers::get_item_movements),
        )
        .route(
            "/branches/:branch_id/movements",
            get(handlers::list_branch_movements),
        )
        // Snapshot audit
        .route(
            "/branches/:branch_id/items/:item_id/audit",
            get(handlers::verify_snapshot),
        )
        .route(
            "/branches/:branch_id/items/:item_id/rebuild",
            post(handlers::rebuild_snapshot),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock alert routes (protected)
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/branches/:branch_id", get(handlers::list_alerts))
        .route("/branches/:branch_id/active", get(handlers::get_active_alerts))
        .route(
            "/branches/:branch_id/low-stock",
            get(handlers::get_low_stock_items),
        )
        .route("/:alert_id/resolve", put(handlers::resolve_alert))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Notification routes (protected)
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/branches/:branch_id", get(handlers::list_notifications))
        .route(
            "/queue/process",
            post(handlers::process_notification_queue),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
