//! Error handling for the Cafe Stock Management Platform
//!
//! Provides consistent error responses in Thai and English. Errors are split
//! into three families that callers must be able to tell apart: validation
//! errors (caller-fixable), business-rule rejections (expected, surfaced to
//! the user), and infrastructure failures (retry is the caller's decision).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use shared::units::UnitError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_th: String,
    },

    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(String),

    #[error("Incompatible units: {from} -> {to}")]
    IncompatibleUnits { from: String, to: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Business-rule errors
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    #[error("No stock record exists for this branch and item")]
    NoStockRecord,

    #[error("Movement already recorded for reference {reference}")]
    DuplicateMovement { reference: String },

    // Infrastructure errors
    #[error("Operation deadline expired")]
    DeadlineExceeded,

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<UnitError> for AppError {
    fn from(err: UnitError) -> Self {
        match err {
            UnitError::Unsupported(unit) => AppError::UnsupportedUnit(unit),
            UnitError::Incompatible { from, to } => AppError::IncompatibleUnits {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_th: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "INSUFFICIENT_PERMISSIONS".to_string(),
                    message_en: "You do not have permission to perform this action".to_string(),
                    message_th: "คุณไม่มีสิทธิ์ในการดำเนินการนี้".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message, message_th } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_th: message_th.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::UnsupportedUnit(unit) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "UNSUPPORTED_UNIT".to_string(),
                    message_en: format!("Unit '{}' is not recognized", unit),
                    message_th: format!("ไม่รู้จักหน่วย '{}'", unit),
                    field: Some("unit".to_string()),
                },
            ),
            AppError::IncompatibleUnits { from, to } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INCOMPATIBLE_UNITS".to_string(),
                    message_en: format!("Cannot convert from '{}' to '{}'", from, to),
                    message_th: format!("ไม่สามารถแปลงจาก '{}' เป็น '{}' ได้", from, to),
                    field: Some("unit".to_string()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_th: format!("ไม่พบ {}", resource),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_th: format!("มีข้อมูล {} นี้อยู่แล้ว", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::InsufficientStock { requested, available } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock: requested {}, available {}",
                        requested, available
                    ),
                    message_th: format!(
                        "สต็อกไม่เพียงพอ: ต้องการ {} คงเหลือ {}",
                        requested, available
                    ),
                    field: None,
                },
            ),
            AppError::NoStockRecord => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NO_STOCK_RECORD".to_string(),
                    message_en: "No stock record exists for this branch and item".to_string(),
                    message_th: "ยังไม่มีบันทึกสต็อกสำหรับสาขาและสินค้านี้".to_string(),
                    field: None,
                },
            ),
            AppError::DuplicateMovement { reference } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_MOVEMENT".to_string(),
                    message_en: format!("Movement already recorded for reference {}", reference),
                    message_th: format!("มีการบันทึกรายการสำหรับอ้างอิง {} แล้ว", reference),
                    field: None,
                },
            ),
            AppError::DeadlineExceeded => (
                StatusCode::REQUEST_TIMEOUT,
                ErrorDetail {
                    code: "DEADLINE_EXCEEDED".to_string(),
                    message_en: "Operation deadline expired before the stock lock was acquired"
                        .to_string(),
                    message_th: "หมดเวลาดำเนินการก่อนเริ่มบันทึกสต็อก".to_string(),
                    field: None,
                },
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message_en: format!("External service error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดกับบริการภายนอก: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดในการตั้งค่า: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดกับฐานข้อมูล".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
