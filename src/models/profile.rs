use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "profile_role", rename_all = "snake_case")]
pub enum ProfileRole {
    Customer,
    Contractor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "business_type", rename_all = "snake_case")]
pub enum BusinessType {
    SoleTrader,
    Ltd,
}

/// A platform user. Contractors with a non-null trade are matching candidates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub role: ProfileRole,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub postcode: Option<String>,
    pub trade: Option<String>,
    pub radius_km: Option<f64>,
    pub business_type: Option<BusinessType>,
    pub employee_count: Option<i32>,
    pub is_employer: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable profile fields; anything else in the body is ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub role: Option<ProfileRole>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub postcode: Option<String>,
    pub trade: Option<String>,
    pub radius_km: Option<f64>,
    pub business_type: Option<BusinessType>,
    pub employee_count: Option<i32>,
    pub is_employer: Option<bool>,
}
