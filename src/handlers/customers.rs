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
use crate::models::{Customer, CustomerCreate, CustomerUpdate};
use crate::routes::AppState;
use crate::validation::{validate_email, validate_required};

/// Email is optional on customer records; only a non-blank value is checked.
fn validate_optional_email(email: Option<&str>) -> Result<(), ApiError> {
    match email {
        Some(v) if !v.trim().is_empty() => validate_email(v).map_err(ApiError::bad_request),
        _ => Ok(()),
    }
}

/// GET /api/customers - List the caller's customer book, by name
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE contractor_id = $1 ORDER BY name ASC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(customers))
}

/// POST /api/customers - Add a customer to the caller's book
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CustomerCreate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    validate_required(body.name.as_deref(), "Name").map_err(ApiError::bad_request)?;
    validate_optional_email(body.email.as_deref())?;

    let created = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (contractor_id, name, email, phone, postcode, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(user.user_id)
    .bind(&body.name)
    .bind(&body.email)
    .bind(&body.phone)
    .bind(&body.postcode)
    .bind(&body.notes)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/customers/:id - Get one customer from the caller's book
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND contractor_id = $2",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(customer))
}

/// PATCH /api/customers/:id - Update a customer in the caller's book
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Json<CustomerUpdate>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    validate_optional_email(body.email.as_deref())?;

    let mut query = QueryBuilder::<Postgres>::new("UPDATE customers SET updated_at = now()");
    if let Some(v) = &body.name {
        query.push(", name = ").push_bind(v);
    }
    if let Some(v) = &body.email {
        query.push(", email = ").push_bind(v);
    }
    if let Some(v) = &body.phone {
        query.push(", phone = ").push_bind(v);
    }
    if let Some(v) = &body.postcode {
        query.push(", postcode = ").push_bind(v);
    }
    if let Some(v) = &body.notes {
        query.push(", notes = ").push_bind(v);
    }
    query.push(" WHERE id = ").push_bind(id);
    query.push(" AND contractor_id = ").push_bind(user.user_id);
    query.push(" RETURNING *");

    let updated = query
        .build_query_as::<Customer>()
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(updated))
}

/// DELETE /api/customers/:id - Remove a customer from the caller's book
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("DELETE FROM customers WHERE id = $1 AND contractor_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "success": true })))
}
