use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Declined,
}

/// A proposed pairing between a request and a contractor. At most one row per
/// (request_id, contractor_id) pair, enforced by a unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequestMatch {
    pub id: Uuid,
    pub request_id: Uuid,
    pub contractor_id: Uuid,
    pub status: MatchStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
