//! Resource API routes.
//!
//! JSON:API endpoints over every registered resource type:
//! - `GET /api/{resource}`: index, shaped by include/sort/filter/page
//! - `GET /api/{resource}/{id}`: show, `include` honored
//! - `POST /api/{resource}`: create
//! - `PATCH /api/{resource}/{id}`: update
//! - `DELETE /api/{resource}/{id}`: destroy

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;

use crate::directive::DirectiveParams;
use crate::error::AppResult;
use crate::policy::Subject;
use crate::serialize::CONTENT_TYPE;
use crate::state::AppState;

/// Create the resource router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/{resource}", get(index).post(create))
        .route("/api/{resource}/{id}", get(show).patch(update).delete(destroy))
}

/// Subject from `Authorization: Bearer <subject>`; anonymous otherwise.
impl<S: Send + Sync> FromRequestParts<S> for Subject {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map_or(Subject::Anonymous, |token| Subject::User(token.to_string()));
        Ok(subject)
    }
}

fn document(status: StatusCode, body: Value) -> Response {
    (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body.to_string()).into_response()
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "resource_types": state.resource_count(),
    }))
}

async fn index(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    subject: Subject,
    Query(params): Query<DirectiveParams>,
) -> AppResult<Response> {
    let body = state.resource(&resource)?.index(&subject, &params)?;
    Ok(document(StatusCode::OK, body))
}

async fn show(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    subject: Subject,
    Query(params): Query<DirectiveParams>,
) -> AppResult<Response> {
    let body = state.resource(&resource)?.show(&subject, &id, &params)?;
    Ok(document(StatusCode::OK, body))
}

async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    subject: Subject,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    let body = state.resource(&resource)?.create(&subject, &payload)?;
    Ok(document(StatusCode::CREATED, body))
}

async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    subject: Subject,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    let body = state.resource(&resource)?.update(&subject, &id, &payload)?;
    Ok(document(StatusCode::OK, body))
}

async fn destroy(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    subject: Subject,
) -> AppResult<StatusCode> {
    state.resource(&resource)?.destroy(&subject, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
