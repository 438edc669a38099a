//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters for listing endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 200;

    fn default_limit() -> i64 {
        50
    }

    /// Clamp the requested page size into the allowed range
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
            offset: self.offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: Self::default_limit(),
            offset: 0,
        }
    }
}
