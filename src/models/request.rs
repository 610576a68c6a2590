use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Open,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

/// A customer's posted service need. Matching runs only while status is `open`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Request {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub trade: Option<String>,
    pub postcode: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub timeline: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The request fields exposed on a contractor's lead
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RequestSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub trade: Option<String>,
    pub postcode: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub timeline: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestCreate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub trade: Option<String>,
    pub postcode: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub timeline: Option<String>,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub trade: Option<String>,
    pub postcode: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub timeline: Option<String>,
    pub status: Option<RequestStatus>,
}
