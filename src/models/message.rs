use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::profile::ProfileRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub request_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SenderSummary {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub role: ProfileRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageWithSender {
    #[serde(flatten)]
    pub message: Message,
    pub sender: Option<SenderSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageCreate {
    pub body: Option<String>,
    pub attachment_url: Option<String>,
}
