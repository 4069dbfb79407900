//! Admin API tokens.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A stored admin token. Only the HMAC of the raw token is kept.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i64,
    pub name: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// How an operator names a token on the command line: by id when the
/// input is numeric, by name otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSelector {
    Id(i64),
    Name(String),
}

impl TokenSelector {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.parse::<i64>() {
            Ok(id) => TokenSelector::Id(id),
            Err(_) => TokenSelector::Name(input.to_string()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Returns the unrevoked token with this digest and stamps its
    /// `last_used_at`, or `None` when there is no such token.
    async fn authenticate(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the digest is already stored.
    async fn insert(&self, name: &str, token_hash: &str) -> Result<ApiToken, AppError>;

    /// Newest first, revoked ones included.
    async fn all(&self) -> Result<Vec<ApiToken>, AppError>;

    /// By name, the newest token wins.
    async fn find(&self, selector: &TokenSelector) -> Result<Option<ApiToken>, AppError>;

    /// Returns the revoked token, or `None` if it was already revoked or
    /// does not exist.
    async fn revoke(&self, id: i64) -> Result<Option<ApiToken>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(TokenSelector::parse("12"), TokenSelector::Id(12));
        assert_eq!(
            TokenSelector::parse(" Editor laptop "),
            TokenSelector::Name("Editor laptop".to_string())
        );
        assert_eq!(
            TokenSelector::parse("12a"),
            TokenSelector::Name("12a".to_string())
        );
    }
}
