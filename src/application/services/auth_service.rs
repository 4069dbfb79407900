//! Admin tokens: request authentication and the token lifecycle used by the
//! admin CLI.
//!
//! Raw tokens are shown once when issued. Only their HMAC-SHA256 digest,
//! keyed by `TOKEN_SIGNING_SECRET`, is stored, so a leaked table does not
//! leak usable tokens.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::{ApiToken, TokenRepository, TokenSelector};
use crate::error::AppError;
use crate::utils::code_generator::generate_api_token;

type HmacSha256 = Hmac<Sha256>;

/// Shortest raw token accepted when the operator supplies their own value.
pub const MIN_TOKEN_LENGTH: usize = 16;

/// Hex HMAC-SHA256 of `token`. Server and CLI both go through here.
pub fn hash_token(signing_secret: &str, token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The admin behind an authenticated request. Stored as a request extension
/// by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminToken {
    pub id: i64,
    pub name: String,
}

/// A freshly issued token with its raw value.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: ApiToken,
    pub raw: String,
}

pub struct AuthService<R: TokenRepository> {
    repository: Arc<R>,
    signing_secret: String,
}

impl<R: TokenRepository> AuthService<R> {
    pub fn new(repository: Arc<R>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Resolves a bearer token to the admin it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for unknown and revoked tokens.
    pub async fn authenticate(&self, raw: &str) -> Result<AdminToken, AppError> {
        let digest = hash_token(&self.signing_secret, raw);

        let token = self.repository.authenticate(&digest).await?.ok_or_else(|| {
            AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid or revoked token" }))
        })?;

        Ok(AdminToken {
            id: token.id,
            name: token.name,
        })
    }

    /// Stores a new token under `name`. A random value is generated unless
    /// `raw` is given.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a blank name or a raw value shorter
    ///   than [`MIN_TOKEN_LENGTH`]
    /// - [`AppError::Conflict`] if the same raw value is already stored
    pub async fn issue(&self, name: &str, raw: Option<String>) -> Result<IssuedToken, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request(
                "Token name is required",
                json!({ "field": "name" }),
            ));
        }

        let raw = match raw {
            Some(raw) if raw.len() < MIN_TOKEN_LENGTH => {
                return Err(AppError::bad_request(
                    "Token is too short",
                    json!({ "min_length": MIN_TOKEN_LENGTH }),
                ));
            }
            Some(raw) => raw,
            None => generate_api_token(),
        };

        let token = self
            .repository
            .insert(name, &hash_token(&self.signing_secret, &raw))
            .await?;
        info!(token_id = token.id, name = %token.name, "Admin token issued");

        Ok(IssuedToken { token, raw })
    }

    pub async fn tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        self.repository.all().await
    }

    pub async fn find(&self, selector: &TokenSelector) -> Result<Option<ApiToken>, AppError> {
        self.repository.find(selector).await
    }

    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no token has this id
    /// - [`AppError::Conflict`] if it is already revoked
    pub async fn revoke(&self, id: i64) -> Result<ApiToken, AppError> {
        if let Some(token) = self.repository.revoke(id).await? {
            info!(token_id = id, name = %token.name, "Admin token revoked");
            return Ok(token);
        }

        match self.repository.find(&TokenSelector::Id(id)).await? {
            Some(_) => Err(AppError::conflict(
                "Token is already revoked",
                json!({ "id": id }),
            )),
            None => Err(AppError::not_found("Token not found", json!({ "id": id }))),
        }
    }
}
