//! Request and response types for crm-daemon HTTP endpoints, plus the
//! error → status mapping every handler shares.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crm_db::{StoreError, UQ_ORDER_NUMBER, UQ_QUOTE_NUMBER};
use crm_promotion::PromotionDecision;
use crm_schemas::{Order, Quote, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

// ---------------------------------------------------------------------------
// /api/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub store_ok: bool,
    pub uptime_secs: u64,
}

// ---------------------------------------------------------------------------
// DELETE /api/<entity>/:id
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// POST /api/quotes/:id/promote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteResponse {
    pub quote: Quote,
    pub decision: PromotionDecision,
    /// Present only when this call created the order.
    pub order: Option<Order>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// VALIDATION_FAILED | NOT_FOUND | CONFLICT | INTERNAL
    pub error: String,
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    /// Body or path could not be decoded; the message carries the JSON path.
    BadRequest(String),
    NotFound { entity: &'static str, id: i64 },
    Conflict { constraint: String },
    Internal(anyhow::Error),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { constraint } => ApiError::Conflict { constraint },
            StoreError::Backend(e) => ApiError::Internal(e),
        }
    }
}

fn conflict_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        UQ_QUOTE_NUMBER => Some("quote_number"),
        UQ_ORDER_NUMBER => Some("order_number"),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(e) => {
                warn!(field = e.field, message = %e.message, "rejected input");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "VALIDATION_FAILED".to_string(),
                        field: Some(e.field.to_string()),
                        message: e.message,
                    },
                )
            }
            ApiError::BadRequest(message) => {
                warn!(%message, "undecodable request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "VALIDATION_FAILED".to_string(),
                        field: None,
                        message,
                    },
                )
            }
            ApiError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "NOT_FOUND".to_string(),
                    field: None,
                    message: format!("{entity} {id} not found"),
                },
            ),
            ApiError::Conflict { constraint } => {
                warn!(%constraint, "unique constraint rejected write");
                let field = conflict_field(&constraint);
                let message = match field {
                    Some(f) => format!("{f} already exists"),
                    None => "duplicate value".to_string(),
                };
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "CONFLICT".to_string(),
                        field: field.map(str::to_string),
                        message,
                    },
                )
            }
            ApiError::Internal(e) => {
                error!(error = %format!("{e:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "INTERNAL".to_string(),
                        field: None,
                        message: "internal error".to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
