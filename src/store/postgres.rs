use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::filters::contains_pattern;
use super::{ApiKeyFilter, DatabaseError, DbResult, LogFilter, Page, ShoeFilter, ShoePredicate, Store};
use crate::models::access_log::{AccessLogView, NewAccessLog};
use crate::models::api_key::{ApiKey, ApiKeyWithOwner, KeyScope, KeyStatus, NewApiKey};
use crate::models::shoe::Shoe;
use crate::models::stats::KeyUsageTotals;
use crate::models::user::{NewUser, Role, User, UserSummary, UserUpdate};

const KEY_WITH_OWNER_SELECT: &str = "SELECT k.id, k.user_id, k.api_key, k.name, k.status, \
     k.request_count, k.last_used, k.created_at, k.expires_at, u.username, u.email \
     FROM api_keys k JOIN users u ON u.id = k.user_id";

const ACCESS_LOG_SELECT: &str = "SELECT l.id, l.api_key_id, k.name AS key_name, u.username, \
     l.endpoint, l.method, l.ip_address, l.status_code, l.request_time \
     FROM api_logs l \
     JOIN api_keys k ON k.id = l.api_key_id \
     JOIN users u ON u.id = k.user_id";

/// `Store` over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become `AlreadyExists`, foreign-key violations `NotFound`;
/// everything else passes through.
fn map_constraint(err: sqlx::Error) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::AlreadyExists,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => DatabaseError::NotFound,
        _ => DatabaseError::Other(err),
    }
}

fn parse_status(raw: String) -> DbResult<KeyStatus> {
    raw.parse::<KeyStatus>()
        .map_err(|e| DatabaseError::Other(sqlx::Error::Decode(Box::new(e))))
}

fn push_shoe_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[ShoePredicate]) {
    builder.push(" WHERE 1=1");
    for predicate in predicates {
        match predicate {
            ShoePredicate::BrandContains(brand) => {
                builder.push(" AND brand ILIKE ").push_bind(contains_pattern(brand));
            }
            ShoePredicate::CategoryIs(category) => {
                builder.push(" AND category = ").push_bind(category.clone());
            }
            ShoePredicate::MinPrice(min) => {
                builder.push(" AND price >= ").push_bind(*min);
            }
            ShoePredicate::MaxPrice(max) => {
                builder.push(" AND price <= ").push_bind(*max);
            }
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> DbResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET
                 username = COALESCE($2, username),
                 email = COALESCE($3, email),
                 role = COALESCE($4, role),
                 password_hash = COALESCE($5, password_hash)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(update.username)
        .bind(update.email)
        .bind(update.role.map(|role| role.as_str()))
        .bind(update.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint)?
        .ok_or(DatabaseError::NotFound)
    }

    async fn delete_user(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> DbResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.email, u.role, u.created_at,
                    COUNT(k.id) AS total_api_keys
             FROM users u
             LEFT JOIN api_keys k ON k.user_id = u.id
             GROUP BY u.id
             ORDER BY u.created_at DESC, u.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_users_with_role(&self, role: Role) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_api_key(&self, key: NewApiKey) -> DbResult<ApiKey> {
        sqlx::query_as::<_, ApiKey>(
            "INSERT INTO api_keys (user_id, api_key, name, status, expires_at)
             VALUES ($1, $2, $3, 'active', $4)
             RETURNING *",
        )
        .bind(key.user_id)
        .bind(&key.api_key)
        .bind(&key.name)
        .bind(key.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)
    }

    async fn list_api_keys_for_user(&self, user_id: i64) -> DbResult<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    async fn list_api_keys(
        &self,
        filter: &ApiKeyFilter,
        page: Page,
    ) -> DbResult<(Vec<ApiKeyWithOwner>, i64)> {
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM api_keys WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let mut builder = QueryBuilder::<Postgres>::new(KEY_WITH_OWNER_SELECT);
        if let Some(status) = status {
            builder.push(" WHERE k.status = ").push_bind(status);
        }
        builder
            .push(" ORDER BY k.created_at DESC, k.id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let keys = builder
            .build_query_as::<ApiKeyWithOwner>()
            .fetch_all(&self.pool)
            .await?;
        Ok((keys, total))
    }

    async fn find_api_key_by_material(&self, api_key: &str) -> DbResult<Option<ApiKeyWithOwner>> {
        let mut builder = QueryBuilder::<Postgres>::new(KEY_WITH_OWNER_SELECT);
        builder.push(" WHERE k.api_key = ").push_bind(api_key);
        let key = builder
            .build_query_as::<ApiKeyWithOwner>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(key)
    }

    async fn toggle_api_key_status(
        &self,
        id: i64,
        scope: KeyScope,
    ) -> DbResult<Option<KeyStatus>> {
        let status = sqlx::query_scalar::<_, String>(
            "UPDATE api_keys
             SET status = CASE WHEN status = 'active' THEN 'inactive' ELSE 'active' END
             WHERE id = $1 AND ($2::BIGINT IS NULL OR user_id = $2)
             RETURNING status",
        )
        .bind(id)
        .bind(scope.owner())
        .fetch_optional(&self.pool)
        .await?;

        status.map(parse_status).transpose()
    }

    async fn delete_api_key(&self, id: i64, scope: KeyScope) -> DbResult<bool> {
        let result = sqlx::query(
            "DELETE FROM api_keys WHERE id = $1 AND ($2::BIGINT IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(scope.owner())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_inactive_api_keys(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM api_keys WHERE status = 'inactive'")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn touch_api_key(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE api_keys SET request_count = request_count + 1, last_used = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn append_access_log(&self, entry: NewAccessLog) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO api_logs (api_key_id, endpoint, method, ip_address)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.api_key_id)
        .bind(&entry.endpoint)
        .bind(&entry.method)
        .bind(&entry.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn key_usage_totals(&self) -> DbResult<KeyUsageTotals> {
        let totals = sqlx::query_as::<_, KeyUsageTotals>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'active') AS active,
                    COUNT(*) FILTER (WHERE status = 'inactive') AS inactive,
                    COALESCE(SUM(request_count), 0)::BIGINT AS total_requests
             FROM api_keys",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn list_access_logs(&self, filter: &LogFilter) -> DbResult<Vec<AccessLogView>> {
        let mut builder = QueryBuilder::<Postgres>::new(ACCESS_LOG_SELECT);
        builder.push(" WHERE 1=1");
        if let Some(start) = filter.start_bound() {
            builder.push(" AND l.request_time >= ").push_bind(start);
        }
        if let Some(end) = filter.end_bound() {
            builder.push(" AND l.request_time < ").push_bind(end);
        }
        if let Some(term) = filter.username_term() {
            builder
                .push(" AND u.username ILIKE ")
                .push_bind(contains_pattern(term));
        }
        builder
            .push(" ORDER BY l.request_time DESC, l.id DESC LIMIT ")
            .push_bind(i64::from(filter.limit));

        debug!("Listing access logs: {:?}", filter);
        let logs = builder
            .build_query_as::<AccessLogView>()
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }

    async fn list_shoes(&self, filter: &ShoeFilter, page: Page) -> DbResult<(Vec<Shoe>, i64)> {
        let predicates = filter.predicates();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shoes");
        push_shoe_predicates(&mut count, &predicates);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM shoes");
        push_shoe_predicates(&mut builder, &predicates);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let shoes = builder
            .build_query_as::<Shoe>()
            .fetch_all(&self.pool)
            .await?;
        Ok((shoes, total))
    }

    async fn find_shoe(&self, id: i64) -> DbResult<Option<Shoe>> {
        let shoe = sqlx::query_as::<_, Shoe>("SELECT * FROM shoes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shoe)
    }

    async fn search_shoes(&self, term: &str) -> DbResult<Vec<Shoe>> {
        let shoes = sqlx::query_as::<_, Shoe>(
            "SELECT * FROM shoes
             WHERE brand ILIKE $1 OR model ILIKE $1 OR description ILIKE $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;
        Ok(shoes)
    }

    async fn shoe_categories(&self) -> DbResult<Vec<String>> {
        let categories =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM shoes ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn shoe_brands(&self) -> DbResult<Vec<String>> {
        let brands =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT brand FROM shoes ORDER BY brand")
                .fetch_all(&self.pool)
                .await?;
        Ok(brands)
    }
}
