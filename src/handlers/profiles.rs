use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Extension,
};
use sqlx::{Postgres, QueryBuilder};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Profile, ProfileUpdate};
use crate::routes::AppState;
use crate::validation::{normalize_postcode, validate_phone, validate_postcode};

/// GET /api/profiles/me - The caller's own profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>, ApiError> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(profile))
}

/// PATCH /api/profiles/me - Update the caller's profile.
/// Postcode and phone are validated; the postcode is stored normalized.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    validate_postcode(body.postcode.as_deref()).map_err(ApiError::bad_request)?;
    validate_phone(body.phone.as_deref()).map_err(ApiError::bad_request)?;

    let postcode = body.postcode.as_deref().map(normalize_postcode);

    let mut query = QueryBuilder::<Postgres>::new("UPDATE profiles SET updated_at = now()");
    if let Some(v) = body.role {
        query.push(", role = ").push_bind(v);
    }
    if let Some(v) = &body.display_name {
        query.push(", display_name = ").push_bind(v);
    }
    if let Some(v) = &body.phone {
        query.push(", phone = ").push_bind(v);
    }
    if let Some(v) = postcode {
        query.push(", postcode = ").push_bind(v);
    }
    if let Some(v) = &body.trade {
        query.push(", trade = ").push_bind(v);
    }
    if let Some(v) = body.radius_km {
        query.push(", radius_km = ").push_bind(v);
    }
    if let Some(v) = body.business_type {
        query.push(", business_type = ").push_bind(v);
    }
    if let Some(v) = body.employee_count {
        query.push(", employee_count = ").push_bind(v);
    }
    if let Some(v) = body.is_employer {
        query.push(", is_employer = ").push_bind(v);
    }
    query.push(" WHERE id = ").push_bind(user.user_id);
    query.push(" RETURNING *");

    let updated = query
        .build_query_as::<Profile>()
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(updated))
}
