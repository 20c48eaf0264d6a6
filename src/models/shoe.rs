use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shoe {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub category: String,
    pub price: f64,
    pub color: Option<String>,
    pub stock: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
