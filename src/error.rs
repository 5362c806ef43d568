use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::datasource::DataSourceError;

/// A numeric text field could not be parsed as a decimal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {field} as decimal: {input:?}")]
pub struct ParseError {
    pub field: String,
    pub input: String,
}

impl ParseError {
    pub fn new(field: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            input: input.into(),
        }
    }
}

/// Malformed or semantically invalid input value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("fill {fill_key} has non-positive size {size}")]
    NonPositiveSize { fill_key: String, size: String },
    #[error("unknown side code: {0:?}")]
    UnknownSide(String),
    #[error("invalid precision {0}: must be positive and coarse enough to grid the book prices")]
    InvalidPrecision(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("book level at {price} has non-positive size {size}")]
    NonPositiveLevelSize { price: String, size: String },
    #[error("decimal overflow in {0}")]
    Overflow(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<DataSourceError> for AppError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidPrecision(_) => AppError::BadRequest(err.to_string()),
            // Everything else comes from exchange data, not from the caller.
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
