use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json as SqlJson;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Quote, QuoteCreate, QuoteStatus, QuoteUpdate};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct QuotesQuery {
    pub job_id: Option<Uuid>,
}

/// Quotes hang off jobs, so ownership is always checked through the parent
/// job's contractor_id.
async fn verify_job_ownership(
    db: &PgPool,
    job_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM jobs WHERE id = $1 AND contractor_id = $2")
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    Ok(())
}

async fn fetch_owned_quote(
    db: &PgPool,
    quote_id: Uuid,
    user_id: Uuid,
) -> Result<Quote, ApiError> {
    sqlx::query_as::<_, Quote>(
        "SELECT q.* FROM quotes q \
         JOIN jobs j ON j.id = q.job_id \
         WHERE q.id = $1 AND j.contractor_id = $2",
    )
    .bind(quote_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Quote not found"))
}

/// GET /api/quotes?job_id=... - List quotes for one of the caller's jobs
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<QuotesQuery>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let job_id = query
        .job_id
        .ok_or_else(|| ApiError::bad_request("job_id is required"))?;

    verify_job_ownership(&state.db, job_id, user.user_id).await?;

    let quotes = sqlx::query_as::<_, Quote>(
        "SELECT * FROM quotes WHERE job_id = $1 ORDER BY created_at DESC",
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(quotes))
}

/// POST /api/quotes - Create a quote against one of the caller's jobs
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<QuoteCreate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    let job_id = body
        .job_id
        .ok_or_else(|| ApiError::bad_request("job_id is required"))?;
    let amount = body
        .amount
        .ok_or_else(|| ApiError::bad_request("amount is required"))?;

    verify_job_ownership(&state.db, job_id, user.user_id).await?;

    let created = sqlx::query_as::<_, Quote>(
        "INSERT INTO quotes (job_id, status, amount, description, line_items, valid_until) \
         VALUES ($1, COALESCE($2, 'draft'), $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(job_id)
    .bind(body.status)
    .bind(amount)
    .bind(&body.description)
    .bind(body.line_items.map(SqlJson))
    .bind(body.valid_until)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/quotes/:id - Get a quote on one of the caller's jobs
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    let quote = fetch_owned_quote(&state.db, id, user.user_id).await?;
    Ok(Json(quote))
}

/// PATCH /api/quotes/:id - Update a quote. Moving to `sent` stamps sent_at;
/// moving to `accepted` or `declined` stamps responded_at.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Json<QuoteUpdate>, JsonRejection>,
) -> Result<Json<Quote>, ApiError> {
    fetch_owned_quote(&state.db, id, user.user_id).await?;

    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    let mut query = QueryBuilder::<Postgres>::new("UPDATE quotes SET updated_at = now()");
    if let Some(v) = body.status {
        query.push(", status = ").push_bind(v);
    }
    if let Some(v) = body.amount {
        query.push(", amount = ").push_bind(v);
    }
    if let Some(v) = &body.description {
        query.push(", description = ").push_bind(v);
    }
    if let Some(v) = body.line_items.clone() {
        query.push(", line_items = ").push_bind(SqlJson(v));
    }
    if let Some(v) = body.valid_until {
        query.push(", valid_until = ").push_bind(v);
    }
    if let Some(v) = body.sent_at {
        query.push(", sent_at = ").push_bind(v);
    }
    if let Some(v) = body.responded_at {
        query.push(", responded_at = ").push_bind(v);
    }

    if body.status == Some(QuoteStatus::Sent) && body.sent_at.is_none() {
        query.push(", sent_at = now()");
    }
    if matches!(
        body.status,
        Some(QuoteStatus::Accepted) | Some(QuoteStatus::Declined)
    ) && body.responded_at.is_none()
    {
        query.push(", responded_at = now()");
    }

    query.push(" WHERE id = ").push_bind(id);
    query.push(" RETURNING *");

    let updated = query
        .build_query_as::<Quote>()
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    Ok(Json(updated))
}

/// DELETE /api/quotes/:id - Delete a quote on one of the caller's jobs
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    fetch_owned_quote(&state.db, id, user.user_id).await?;

    sqlx::query("DELETE FROM quotes WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "success": true })))
}
