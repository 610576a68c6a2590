use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::matching::MatchOutcome;
use crate::middleware::AuthUser;
use crate::models::{Request, RequestCreate, RequestUpdate};
use crate::routes::AppState;
use crate::validation::validate_required;

/// GET /api/requests - List the caller's requests, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Request>>, ApiError> {
    let requests = sqlx::query_as::<_, Request>(
        "SELECT * FROM requests WHERE customer_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(requests))
}

/// POST /api/requests - Create a request for the caller.
///
/// When the new request is open, contractor matching runs as a best-effort
/// side effect; a matching failure never fails the creation.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<RequestCreate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    validate_required(body.title.as_deref(), "Title").map_err(ApiError::bad_request)?;

    let created = sqlx::query_as::<_, Request>(
        "INSERT INTO requests \
             (customer_id, title, description, trade, postcode, budget_min, budget_max, timeline, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'open')) \
         RETURNING *",
    )
    .bind(user.user_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.trade)
    .bind(&body.postcode)
    .bind(body.budget_min)
    .bind(body.budget_max)
    .bind(&body.timeline)
    .bind(body.status)
    .fetch_one(&state.db)
    .await?;

    state.matching.try_match(&created).await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/requests/:id - Get one of the caller's requests
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Request>, ApiError> {
    let request =
        sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1 AND customer_id = $2")
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| ApiError::not_found("Request not found"))?;

    Ok(Json(request))
}

/// PATCH /api/requests/:id - Update writable fields on the caller's request
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Json<RequestUpdate>, JsonRejection>,
) -> Result<Json<Request>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    let mut query = QueryBuilder::<Postgres>::new("UPDATE requests SET updated_at = now()");
    if let Some(v) = &body.title {
        query.push(", title = ").push_bind(v);
    }
    if let Some(v) = &body.description {
        query.push(", description = ").push_bind(v);
    }
    if let Some(v) = &body.trade {
        query.push(", trade = ").push_bind(v);
    }
    if let Some(v) = &body.postcode {
        query.push(", postcode = ").push_bind(v);
    }
    if let Some(v) = body.budget_min {
        query.push(", budget_min = ").push_bind(v);
    }
    if let Some(v) = body.budget_max {
        query.push(", budget_max = ").push_bind(v);
    }
    if let Some(v) = &body.timeline {
        query.push(", timeline = ").push_bind(v);
    }
    if let Some(v) = body.status {
        query.push(", status = ").push_bind(v);
    }
    query.push(" WHERE id = ").push_bind(id);
    query.push(" AND customer_id = ").push_bind(user.user_id);
    query.push(" RETURNING *");

    let updated = query
        .build_query_as::<Request>()
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    Ok(Json(updated))
}

/// DELETE /api/requests/:id - Delete the caller's request
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM requests WHERE id = $1 AND customer_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// POST /api/requests/:id/match - Explicitly trigger contractor matching.
/// Only the owning customer can trigger it, and only while the request is open.
pub async fn match_contractors(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchOutcome>, ApiError> {
    let request =
        sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1 AND customer_id = $2")
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let outcome = state.matching.match_request(&request).await?;

    Ok(Json(outcome))
}
