use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One authorized API-key request; rows are append-only.
#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub api_key_id: i64,
    pub endpoint: String,
    pub method: String,
    pub ip_address: Option<String>,
}

/// Log entry joined with the key name and owning username, for admin views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessLogView {
    pub id: i64,
    pub api_key_id: i64,
    pub key_name: String,
    pub username: String,
    pub endpoint: String,
    pub method: String,
    pub ip_address: Option<String>,
    pub status_code: Option<i32>,
    pub request_time: DateTime<Utc>,
}
