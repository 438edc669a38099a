//! Business logic services for the Cafe Stock Management Platform

pub mod alerts;
pub mod catalog;
pub mod notifications;
pub mod stock;

pub use alerts::AlertService;
pub use catalog::CatalogService;
pub use notifications::NotificationService;
pub use stock::StockService;
