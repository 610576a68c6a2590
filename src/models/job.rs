use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Quoted,
    Scheduled,
    InProgress,
    Done,
    Cancelled,
}

/// A contractor's piece of work, tracked independently of the request flow
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub contractor_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub title: String,
    pub status: JobStatus,
    pub due_date: Option<NaiveDate>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub amount_quoted: Option<Decimal>,
    pub amount_invoiced: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobCreate {
    pub title: Option<String>,
    pub customer_id: Option<Uuid>,
    pub status: Option<JobStatus>,
    pub due_date: Option<NaiveDate>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub amount_quoted: Option<Decimal>,
    pub amount_invoiced: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub customer_id: Option<Uuid>,
    pub status: Option<JobStatus>,
    pub due_date: Option<NaiveDate>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub amount_quoted: Option<Decimal>,
    pub amount_invoiced: Option<Decimal>,
}
