use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "quote_status", rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// A priced offer against a job, owned by the job's contractor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: QuoteStatus,
    pub amount: Decimal,
    pub description: Option<String>,
    pub line_items: Option<Json<Vec<QuoteLineItem>>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteCreate {
    pub job_id: Option<Uuid>,
    pub status: Option<QuoteStatus>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub line_items: Option<Vec<QuoteLineItem>>,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteUpdate {
    pub status: Option<QuoteStatus>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub line_items: Option<Vec<QuoteLineItem>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
}
