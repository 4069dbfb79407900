//! Admin authentication for `/api` routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Resolves `Authorization: Bearer <token>` to an
/// [`AdminToken`](crate::application::services::AdminToken) and stores it in
/// the request extensions, where editor handlers pick it up to attribute
/// their actions. Anything else is a 401.
pub async fn layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(raw) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authorization header is missing or invalid" }),
            )
        })?;

    let admin = state.auth_service.authenticate(&raw).await?;
    tracing::Span::current().record("admin", admin.name.as_str());
    parts.extensions.insert(admin);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
