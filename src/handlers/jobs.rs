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
use crate::middleware::AuthUser;
use crate::models::{Job, JobCreate, JobUpdate};
use crate::routes::AppState;
use crate::validation::validate_required;

/// GET /api/jobs - List the caller's jobs, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let jobs = sqlx::query_as::<_, Job>(
        "SELECT * FROM jobs WHERE contractor_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// POST /api/jobs - Create a job owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<JobCreate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    validate_required(body.title.as_deref(), "Title").map_err(ApiError::bad_request)?;

    let created = sqlx::query_as::<_, Job>(
        "INSERT INTO jobs \
             (contractor_id, title, customer_id, status, due_date, scheduled_at, notes, amount_quoted, amount_invoiced) \
         VALUES ($1, $2, $3, COALESCE($4, 'draft'), $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(user.user_id)
    .bind(&body.title)
    .bind(body.customer_id)
    .bind(body.status)
    .bind(body.due_date)
    .bind(body.scheduled_at)
    .bind(&body.notes)
    .bind(body.amount_quoted)
    .bind(body.amount_invoiced)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/jobs/:id - Get one of the caller's jobs
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 AND contractor_id = $2")
        .bind(id)
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(job))
}

/// PATCH /api/jobs/:id - Update writable fields on the caller's job
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Json<JobUpdate>, JsonRejection>,
) -> Result<Json<Job>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    let mut query = QueryBuilder::<Postgres>::new("UPDATE jobs SET updated_at = now()");
    if let Some(v) = &body.title {
        query.push(", title = ").push_bind(v);
    }
    if let Some(v) = body.customer_id {
        query.push(", customer_id = ").push_bind(v);
    }
    if let Some(v) = body.status {
        query.push(", status = ").push_bind(v);
    }
    if let Some(v) = body.due_date {
        query.push(", due_date = ").push_bind(v);
    }
    if let Some(v) = body.scheduled_at {
        query.push(", scheduled_at = ").push_bind(v);
    }
    if let Some(v) = &body.notes {
        query.push(", notes = ").push_bind(v);
    }
    if let Some(v) = body.amount_quoted {
        query.push(", amount_quoted = ").push_bind(v);
    }
    if let Some(v) = body.amount_invoiced {
        query.push(", amount_invoiced = ").push_bind(v);
    }
    query.push(" WHERE id = ").push_bind(id);
    query.push(" AND contractor_id = ").push_bind(user.user_id);
    query.push(" RETURNING *");

    let updated = query
        .build_query_as::<Job>()
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(updated))
}

/// DELETE /api/jobs/:id - Delete the caller's job
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM jobs WHERE id = $1 AND contractor_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "success": true })))
}
