use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{MatchStatus, ProfileRole, RequestMatch, RequestSummary};
use crate::routes::AppState;

/// A contractor's view of a match: the match row plus the request behind it
#[derive(Debug, Serialize)]
pub struct Lead {
    #[serde(flatten)]
    pub match_row: RequestMatch,
    pub request: Option<RequestSummary>,
}

#[derive(Debug, Deserialize)]
pub struct LeadResponse {
    pub status: Option<String>,
}

async fn fetch_request_summaries(
    db: &PgPool,
    request_ids: &[Uuid],
) -> Result<HashMap<Uuid, RequestSummary>, ApiError> {
    let summaries = sqlx::query_as::<_, RequestSummary>(
        "SELECT id, title, description, trade, postcode, budget_min, budget_max, timeline, \
                status, created_at \
         FROM requests WHERE id = ANY($1)",
    )
    .bind(request_ids)
    .fetch_all(db)
    .await?;

    Ok(summaries.into_iter().map(|r| (r.id, r)).collect())
}

/// GET /api/leads - All matches for the current contractor, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    // Leads only make sense for contractor profiles
    let role = sqlx::query_scalar::<_, ProfileRole>("SELECT role FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?;

    if role != Some(ProfileRole::Contractor) {
        return Err(ApiError::forbidden("Only contractors can view leads"));
    }

    let matches = sqlx::query_as::<_, RequestMatch>(
        "SELECT * FROM request_matches WHERE contractor_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    let request_ids: Vec<Uuid> = matches.iter().map(|m| m.request_id).collect();
    let mut summaries = fetch_request_summaries(&state.db, &request_ids).await?;

    let leads = matches
        .into_iter()
        .map(|m| {
            let request = summaries.remove(&m.request_id);
            Lead {
                match_row: m,
                request,
            }
        })
        .collect();

    Ok(Json(leads))
}

/// GET /api/leads/:id - One lead with its request details
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let match_row = sqlx::query_as::<_, RequestMatch>(
        "SELECT * FROM request_matches WHERE id = $1 AND contractor_id = $2",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Lead not found"))?;

    let mut summaries = fetch_request_summaries(&state.db, &[match_row.request_id]).await?;
    let request = summaries.remove(&match_row.request_id);

    Ok(Json(Lead { match_row, request }))
}

/// PATCH /api/leads/:id - Respond to a lead (accept or decline).
/// Accepting or declining stamps responded_at.
pub async fn respond(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Result<Json<LeadResponse>, JsonRejection>,
) -> Result<Json<Lead>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    let status = match body.status.as_deref() {
        None => None,
        Some("pending") => Some(MatchStatus::Pending),
        Some("accepted") => Some(MatchStatus::Accepted),
        Some("declined") => Some(MatchStatus::Declined),
        Some(_) => return Err(ApiError::bad_request("Invalid status")),
    };

    let match_row = match status {
        Some(status) => {
            let responded = matches!(status, MatchStatus::Accepted | MatchStatus::Declined);
            sqlx::query_as::<_, RequestMatch>(
                "UPDATE request_matches \
                 SET updated_at = now(), status = $1, \
                     responded_at = CASE WHEN $2 THEN now() ELSE responded_at END \
                 WHERE id = $3 AND contractor_id = $4 \
                 RETURNING *",
            )
            .bind(status)
            .bind(responded)
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, RequestMatch>(
                "UPDATE request_matches SET updated_at = now() \
                 WHERE id = $1 AND contractor_id = $2 \
                 RETURNING *",
            )
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(&state.db)
            .await?
        }
    }
    .ok_or_else(|| ApiError::not_found("Lead not found"))?;

    let mut summaries = fetch_request_summaries(&state.db, &[match_row.request_id]).await?;
    let request = summaries.remove(&match_row.request_id);

    Ok(Json(Lead { match_row, request }))
}
