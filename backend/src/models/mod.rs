//! Database models for the Cafe Stock Management Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
