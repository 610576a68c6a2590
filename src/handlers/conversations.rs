use axum::{extract::State, response::Json, Extension};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::AppState;

#[derive(Debug, FromRow)]
struct ConversationRow {
    request_id: Uuid,
    title: String,
    status: String,
    created_at: DateTime<Utc>,
    other_id: Option<Uuid>,
    other_name: Option<String>,
    other_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Party {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Conversation {
    pub request_id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub other_party: Option<Party>,
    pub role: &'static str,
}

fn into_conversation(row: ConversationRow, role: &'static str) -> Conversation {
    let other_party = row.other_id.map(|id| Party {
        id,
        display_name: row.other_name,
        role: row.other_role,
    });
    Conversation {
        request_id: row.request_id,
        title: row.title,
        status: row.status,
        created_at: row.created_at,
        other_party,
        role,
    }
}

/// GET /api/conversations - Requests the caller can message on, as customer
/// (their active requests with an accepted contractor) or as contractor (their
/// accepted matches), newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let customer_side = sqlx::query_as::<_, ConversationRow>(
        "SELECT r.id AS request_id, r.title, r.status::text AS status, r.created_at, \
                p.id AS other_id, p.display_name AS other_name, p.role::text AS other_role \
         FROM requests r \
         JOIN request_matches rm ON rm.request_id = r.id AND rm.status = 'accepted' \
         JOIN profiles p ON p.id = rm.contractor_id \
         WHERE r.customer_id = $1 AND r.status IN ('assigned', 'in_progress')",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    let contractor_side = sqlx::query_as::<_, ConversationRow>(
        "SELECT r.id AS request_id, r.title, r.status::text AS status, r.created_at, \
                p.id AS other_id, p.display_name AS other_name, p.role::text AS other_role \
         FROM request_matches rm \
         JOIN requests r ON r.id = rm.request_id \
         JOIN profiles p ON p.id = r.customer_id \
         WHERE rm.contractor_id = $1 AND rm.status = 'accepted'",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    let mut conversations: Vec<Conversation> = customer_side
        .into_iter()
        .map(|row| into_conversation(row, "customer"))
        .chain(
            contractor_side
                .into_iter()
                .map(|row| into_conversation(row, "contractor")),
        )
        .collect();

    // Newest first across both sides
    conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(conversations))
}
