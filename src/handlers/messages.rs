use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Message, MessageCreate, MessageWithSender, SenderSummary};
use crate::routes::AppState;
use crate::validation::validate_required;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
    /// Cursor: only messages created strictly before this timestamp
    pub before: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MessagesPage {
    pub messages: Vec<MessageWithSender>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Messaging on a request is limited to its parties: the owning customer and
/// contractors with an accepted match.
async fn is_party_to_request(
    db: &PgPool,
    request_id: Uuid,
    user_id: Uuid,
) -> Result<bool, ApiError> {
    let is_party = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM requests WHERE id = $1 AND customer_id = $2) \
             OR EXISTS (SELECT 1 FROM request_matches \
                        WHERE request_id = $1 AND contractor_id = $2 AND status = 'accepted')",
    )
    .bind(request_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(is_party)
}

async fn fetch_sender_summaries(
    db: &PgPool,
    sender_ids: &[Uuid],
) -> Result<HashMap<Uuid, SenderSummary>, ApiError> {
    let senders = sqlx::query_as::<_, SenderSummary>(
        "SELECT id, display_name, role FROM profiles WHERE id = ANY($1)",
    )
    .bind(sender_ids)
    .fetch_all(db)
    .await?;

    Ok(senders.into_iter().map(|s| (s.id, s)).collect())
}

/// GET /api/requests/:id/messages - Messages for a request conversation.
/// Paginated newest-first via `limit` and `before`, returned oldest-first for
/// chat display.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesPage>, ApiError> {
    if !is_party_to_request(&state.db, request_id, user.user_id).await? {
        return Err(ApiError::forbidden(
            "Not authorized to message on this request",
        ));
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut sql = QueryBuilder::<Postgres>::new("SELECT * FROM messages WHERE request_id = ");
    sql.push_bind(request_id);
    if let Some(before) = query.before {
        sql.push(" AND created_at < ").push_bind(before);
    }
    sql.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

    let mut messages = sql
        .build_query_as::<Message>()
        .fetch_all(&state.db)
        .await?;

    let has_more = messages.len() as i64 == limit;

    let sender_ids: Vec<Uuid> = messages.iter().map(|m| m.sender_id).collect();
    let senders = fetch_sender_summaries(&state.db, &sender_ids).await?;

    // Oldest-first for chat display
    messages.reverse();

    let messages = messages
        .into_iter()
        .map(|m| {
            let sender = senders.get(&m.sender_id).cloned();
            MessageWithSender { message: m, sender }
        })
        .collect();

    Ok(Json(MessagesPage { messages, has_more }))
}

/// POST /api/requests/:id/messages - Send a message on a request conversation
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
    body: Result<Json<MessageCreate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::invalid_json("Invalid JSON"))?;

    validate_required(body.body.as_deref(), "Message body").map_err(ApiError::bad_request)?;

    if !is_party_to_request(&state.db, request_id, user.user_id).await? {
        return Err(ApiError::forbidden(
            "Not authorized to message on this request",
        ));
    }

    let text = body.body.as_deref().unwrap_or_default().trim().to_string();

    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages (request_id, sender_id, body, attachment_url) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(request_id)
    .bind(user.user_id)
    .bind(text)
    .bind(&body.attachment_url)
    .fetch_one(&state.db)
    .await?;

    let senders = fetch_sender_summaries(&state.db, &[message.sender_id]).await?;
    let sender = senders.get(&message.sender_id).cloned();

    Ok((
        StatusCode::CREATED,
        Json(MessageWithSender { message, sender }),
    ))
}
