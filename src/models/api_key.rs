use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Active,
    Inactive,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "active",
            KeyStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            KeyStatus::Active => KeyStatus::Inactive,
            KeyStatus::Inactive => KeyStatus::Active,
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(KeyStatus::Active),
            "inactive" => Ok(KeyStatus::Inactive),
            other => Err(ParseEnumError {
                kind: "key status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for KeyStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApiKey {
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Full key material (`sk_` followed by 64 hex characters)
    pub api_key: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: KeyStatus,
    pub request_count: i64,
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why a stored key may not authorize a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyRejection {
    #[error("API key inactive")]
    Inactive,
    #[error("API key expired")]
    Expired,
}

impl ApiKey {
    /// Status is checked before expiry, so an inactive expired key reports `Inactive`.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), KeyRejection> {
        if self.status != KeyStatus::Active {
            return Err(KeyRejection::Inactive);
        }
        match self.expires_at {
            Some(expires_at) if expires_at <= now => Err(KeyRejection::Expired),
            _ => Ok(()),
        }
    }
}

/// Key row joined with its owner, as used by the gate and the admin listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApiKeyWithOwner {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub key: ApiKey,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub user_id: i64,
    pub api_key: String,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Absolute expiry for a key issued at `now` that should live `days` days.
pub fn expiry_after_days(now: DateTime<Utc>, days: Option<i64>) -> Option<DateTime<Utc>> {
    days.map(|days| now + Duration::days(days))
}

/// Restricts key lookups and mutations to one owner, or lets admins reach every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    Owner(i64),
    Any,
}

impl KeyScope {
    pub fn owner(&self) -> Option<i64> {
        match self {
            KeyScope::Owner(user_id) => Some(*user_id),
            KeyScope::Any => None,
        }
    }
}

/// Result of a status toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct KeyStatusChange {
    pub id: i64,
    pub status: KeyStatus,
}
