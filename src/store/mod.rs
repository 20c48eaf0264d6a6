use async_trait::async_trait;

use crate::models::access_log::{AccessLogView, NewAccessLog};
use crate::models::api_key::{ApiKey, ApiKeyWithOwner, KeyScope, KeyStatus, NewApiKey};
use crate::models::shoe::Shoe;
use crate::models::stats::KeyUsageTotals;
use crate::models::user::{NewUser, Role, User, UserSummary, UserUpdate};

pub mod filters;
pub mod postgres;

pub use filters::{ApiKeyFilter, LogFilter, Page, ShoeFilter, ShoePredicate};

// Error type for database errors
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DatabaseError>;

/// Credential store and catalog backend. Every method is a single attempt;
/// nothing here retries or caches.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Round-trip to the backend
    async fn ping(&self) -> DbResult<()>;

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>>;

    /// True when either the username or the email is already registered
    async fn username_or_email_taken(&self, username: &str, email: &str) -> DbResult<bool>;

    /// Fails with `AlreadyExists` on a username/email collision
    async fn create_user(&self, user: NewUser) -> DbResult<User>;

    /// Fails with `NotFound` for an unknown id and `AlreadyExists` on a collision
    async fn update_user(&self, id: i64, update: UserUpdate) -> DbResult<User>;

    /// Removes the user and, by cascade, their keys and those keys' logs
    async fn delete_user(&self, id: i64) -> DbResult<bool>;

    async fn list_users(&self) -> DbResult<Vec<UserSummary>>;

    async fn count_users_with_role(&self, role: Role) -> DbResult<i64>;

    /// `NotFound` when the owning user no longer exists
    async fn create_api_key(&self, key: NewApiKey) -> DbResult<ApiKey>;

    /// Keys owned by one user, newest first
    async fn list_api_keys_for_user(&self, user_id: i64) -> DbResult<Vec<ApiKey>>;

    /// Every key with its owner, newest first, plus the unpaged total
    async fn list_api_keys(
        &self,
        filter: &ApiKeyFilter,
        page: Page,
    ) -> DbResult<(Vec<ApiKeyWithOwner>, i64)>;

    /// Exact match on the full key string
    async fn find_api_key_by_material(&self, api_key: &str) -> DbResult<Option<ApiKeyWithOwner>>;

    /// Flips active/inactive in one statement; `None` when the key is absent or out of scope
    async fn toggle_api_key_status(&self, id: i64, scope: KeyScope)
        -> DbResult<Option<KeyStatus>>;

    async fn delete_api_key(&self, id: i64, scope: KeyScope) -> DbResult<bool>;

    /// Deletes every inactive key regardless of owner; returns how many went
    async fn delete_inactive_api_keys(&self) -> DbResult<u64>;

    /// `request_count + 1` and `last_used = now` for one key
    async fn touch_api_key(&self, id: i64) -> DbResult<()>;

    async fn append_access_log(&self, entry: NewAccessLog) -> DbResult<()>;

    async fn key_usage_totals(&self) -> DbResult<KeyUsageTotals>;

    /// Newest first
    async fn list_access_logs(&self, filter: &LogFilter) -> DbResult<Vec<AccessLogView>>;

    /// Newest first, plus the unpaged total
    async fn list_shoes(&self, filter: &ShoeFilter, page: Page) -> DbResult<(Vec<Shoe>, i64)>;

    async fn find_shoe(&self, id: i64) -> DbResult<Option<Shoe>>;

    async fn search_shoes(&self, term: &str) -> DbResult<Vec<Shoe>>;

    /// Distinct, sorted
    async fn shoe_categories(&self) -> DbResult<Vec<String>>;

    /// Distinct, sorted
    async fn shoe_brands(&self) -> DbResult<Vec<String>>;
}
