//! Application error types.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::serialize::CONTENT_TYPE;

/// Application errors.
///
/// Every variant is terminal for the request that raised it.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested includes outside the permitted set or nested too deeply.
    /// Each entry is already formatted as `include=<path>`.
    #[error("found unpermitted parameters: {}", .0.join(", "))]
    UnpermittedInclude(Vec<String>),

    /// A `filter` directive arrived but no filter hook is registered.
    #[error("found unpermitted parameter: filter={0}")]
    UnsupportedFilter(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::UnpermittedInclude(_)
            | AppError::UnsupportedFilter(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as a JSON:API `errors` document.
    pub fn to_document(&self) -> serde_json::Value {
        let status = self.status();
        let code = status.as_u16().to_string();
        let title = status.canonical_reason().unwrap_or("Error");

        let errors: Vec<serde_json::Value> = match self {
            AppError::ValidationFailed(validation) => validation
                .iter()
                .map(|(field, message)| {
                    serde_json::json!({
                        "status": code,
                        "title": title,
                        "detail": format!("{field} {message}"),
                        "source": { "pointer": format!("/data/attributes/{field}") },
                    })
                })
                .collect(),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                vec![serde_json::json!({
                    "status": code,
                    "title": title,
                })]
            }
            _ => vec![serde_json::json!({
                "status": code,
                "title": title,
                "detail": self.to_string(),
            })],
        };

        serde_json::json!({ "errors": errors })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.to_document().to_string();

        (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Per-attribute validation messages collected while building a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against an attribute.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for a single attribute.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate `(attribute, message)` pairs in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| (field.as_str(), message.as_str()))
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{field} {message}"))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}
