use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;

use crate::config::AuthSettings;
use crate::models::user::{Role, User};

/// Every issued key starts with this.
pub const API_KEY_PREFIX: &str = "sk_";
const API_KEY_RANDOM_BYTES: usize = 32;
const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Identity attached to a request once its bearer token verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = anyhow::Error;

    fn try_from(claims: Claims) -> Result<Self> {
        let id = claims
            .sub
            .parse::<i64>()
            .with_context(|| format!("non-numeric subject {:?}", claims.sub))?;
        Ok(Self {
            id,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// HS256 signing material and token lifetime, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    inner: Arc<JwtKeysInner>,
}

struct JwtKeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let ttl_seconds = i64::try_from(ttl_seconds)
            .unwrap_or(MAX_TOKEN_TTL_SECONDS)
            .min(MAX_TOKEN_TTL_SECONDS);
        Self {
            inner: Arc::new(JwtKeysInner {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                validation,
                ttl: Duration::seconds(ttl_seconds),
            }),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            settings.jwt_secret.expose_secret().as_bytes(),
            settings.jwt_expiration_seconds,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    /// Token as if issued at `issued_at`; expiry is `issued_at + ttl`.
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.inner.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
            .context("Failed to sign token")
    }

    /// Signature, algorithm and expiry (zero leeway) must all check out.
    pub fn verify(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)
            .map_err(|e| anyhow!("token rejected: {}", e))?;
        AuthUser::try_from(data.claims)
    }
}

/// Argon2id PHC string with a fresh random salt, computed on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || hash_password_sync(&password))
        .await
        .context("Password hashing task panicked")?
}

/// Accepts Argon2 hashes and legacy bcrypt (`$2a$`, `$2b$`, `$2y$`) hashes.
/// Unparseable hashes never verify.
pub async fn verify_password(password: &str, password_hash: &str) -> bool {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let handle = task::spawn_blocking(move || verify_password_sync(&password, &password_hash));
    match handle.await {
        Ok(verified) => verified,
        Err(e) => {
            tracing::error!("Password verification task panicked: {}", e);
            false
        }
    }
}

fn hash_password_sync(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

fn verify_password_sync(password: &str, password_hash: &str) -> bool {
    if password_hash.starts_with("$2") {
        return bcrypt::verify(password, password_hash).unwrap_or(false);
    }

    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// `sk_` followed by 32 random bytes as lowercase hex.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}
