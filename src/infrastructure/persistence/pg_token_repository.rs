//! PostgreSQL implementation of token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{ApiToken, TokenRepository, TokenSelector};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    name: String,
    token_hash: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for ApiToken {
    fn from(r: TokenRow) -> Self {
        ApiToken {
            id: r.id,
            name: r.name,
            token_hash: r.token_hash,
            created_at: r.created_at,
            last_used_at: r.last_used_at,
            revoked_at: r.revoked_at,
        }
    }
}

/// PostgreSQL repository for admin API tokens.
///
/// Stores HMAC digests only. Raw tokens are never persisted.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

const TOKEN_COLUMNS: &str = "id, name, token_hash, created_at, last_used_at, revoked_at";

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn authenticate(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "UPDATE api_tokens SET last_used_at = NOW()
             WHERE token_hash = $1 AND revoked_at IS NULL
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ApiToken::from))
    }

    async fn insert(&self, name: &str, token_hash: &str) -> Result<ApiToken, AppError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "INSERT INTO api_tokens (name, token_hash) VALUES ($1, $2) RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(name)
        .bind(token_hash)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn all(&self) -> Result<Vec<ApiToken>, AppError> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM api_tokens ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(ApiToken::from).collect())
    }

    async fn find(&self, selector: &TokenSelector) -> Result<Option<ApiToken>, AppError> {
        let by_id = format!("SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE id = $1");
        let by_name = format!(
            "SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE name = $1
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );

        let query = match selector {
            TokenSelector::Id(id) => sqlx::query_as::<_, TokenRow>(&by_id).bind(*id),
            TokenSelector::Name(name) => sqlx::query_as::<_, TokenRow>(&by_name).bind(name.as_str()),
        };

        let row = query.fetch_optional(self.pool.as_ref()).await?;
        Ok(row.map(ApiToken::from))
    }

    async fn revoke(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "UPDATE api_tokens SET revoked_at = NOW()
             WHERE id = $1 AND revoked_at IS NULL
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ApiToken::from))
    }
}
