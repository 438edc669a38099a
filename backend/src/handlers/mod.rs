//! HTTP handlers for the Cafe Stock Management Platform

pub mod alerts;
pub mod catalog;
pub mod health;
pub mod notifications;
pub mod stock;

pub use alerts::*;
pub use catalog::*;
pub use health::*;
pub use notifications::*;
pub use stock::*;
