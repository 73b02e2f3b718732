use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fretline_catalog::{LedgerError, OptionError, PricingError};
use fretline_core::StoreError;
use fretline_order::OrderError;
use serde_json::json;

/// API-facing error. Every domain error kind maps to its own status and
/// message; the quantity/field context is load-bearing for dealers, so
/// nothing is collapsed into a generic failure.
#[derive(Debug)]
pub enum AppError {
    Authentication(String),
    Order(OrderError),
    Pricing(PricingError),
    NotFound(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::Order(err)
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::Pricing(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Pricing(err) => pricing_response(err),
            AppError::Order(err) => order_response(err),
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));
        (status, body).into_response()
    }
}

fn pricing_response(err: PricingError) -> (StatusCode, &'static str, String) {
    match err {
        PricingError::PriceNotFound { .. } => {
            (StatusCode::NOT_FOUND, "price_not_found", err.to_string())
        }
        PricingError::CurrencyMismatch { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "currency_mismatch",
            err.to_string(),
        ),
        PricingError::Store(err) => store_response(err),
    }
}

fn order_response(err: OrderError) -> (StatusCode, &'static str, String) {
    match err {
        OrderError::NotFound(_) | OrderError::ItemNotFound(_) => {
            (StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        OrderError::EmptyOrder | OrderError::InvalidQuantity => {
            (StatusCode::BAD_REQUEST, "invalid_order", err.to_string())
        }
        OrderError::Unauthorized { .. } => {
            (StatusCode::FORBIDDEN, "unauthorized", err.to_string())
        }
        OrderError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "invalid_transition", err.to_string())
        }
        OrderError::Pricing(err) => pricing_response(err),
        OrderError::Options(err) => match err {
            OptionError::MissingRequiredOption { .. } => (
                StatusCode::BAD_REQUEST,
                "missing_required_option",
                err.to_string(),
            ),
            OptionError::UnknownOptionValue { .. } => (
                StatusCode::BAD_REQUEST,
                "unknown_option_value",
                err.to_string(),
            ),
        },
        OrderError::Ledger(err) => match err {
            LedgerError::InsufficientStock { available, .. } => (
                StatusCode::CONFLICT,
                "insufficient_stock",
                format!("only {available} units available"),
            ),
            LedgerError::InvariantViolation { .. } => {
                // A caller bug broke conservation; surface loudly.
                tracing::error!(%err, "ledger invariant violation");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ledger_invariant_violation",
                    err.to_string(),
                )
            }
        },
        OrderError::Store(err) => store_response(err),
    }
}

fn store_response(err: StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::Conflict { .. } => (StatusCode::CONFLICT, "write_conflict", err.to_string()),
        StoreError::Backend(msg) => {
            tracing::error!("storage backend failure: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error".to_string(),
            )
        }
    }
}
