//! Full-response caching for the public read routes.

use axum::{
    body::{Body, HttpBody, to_bytes},
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::infrastructure::cache::CachedPage;
use crate::state::AppState;

/// Largest body stored in the cache. Bigger responses are passed through.
const MAX_CACHED_BODY: usize = 2 * 1024 * 1024;

pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Serves anonymous `GET` requests from the page cache and stores successful
/// responses on a miss.
///
/// Requests carrying an `Authorization` header or a `preview_secret` query
/// parameter always bypass the cache, so drafts never end up in it. Cache
/// errors fall through to rendering.
///
/// Only bodies of known length up to [`MAX_CACHED_BODY`] are stored; others
/// are streamed to the client untouched with `x-cache: BYPASS`.
///
/// The cache is keyed by path and query string and is only ever emptied as a
/// whole, after a publish or an approval.
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    if !is_cacheable(&req) {
        return next.run(req).await;
    }

    let key = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    match st.page_cache.get_page(&key).await {
        Ok(Some(page)) => {
            debug!(key = %key, "Page cache hit");
            return hit(page);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, key = %key, "Page cache read failed"),
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let Some(length) = cacheable_length(&body) else {
        debug!(key = %key, "Response not cached: body too large or of unknown length");
        parts
            .headers
            .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("BYPASS"));
        return Response::from_parts(parts, body);
    };

    let bytes = match to_bytes(body, length).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, key = %key, "Failed to read response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    if let Ok(text) = std::str::from_utf8(&bytes) {
        let page = CachedPage::new(content_type, text);
        if let Err(e) = st
            .page_cache
            .put_page(&key, &page, Some(st.cache_ttl_seconds))
            .await
        {
            warn!(error = %e, key = %key, "Page cache write failed");
        }
    }

    parts
        .headers
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}

fn is_cacheable(req: &Request) -> bool {
    req.method() == Method::GET
        && !req.headers().contains_key(AUTHORIZATION)
        && !req
            .uri()
            .query()
            .is_some_and(|q| q.split('&').any(|pair| pair.starts_with("preview_secret=")))
}

fn cacheable_length(body: &Body) -> Option<usize> {
    body.size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n <= MAX_CACHED_BODY)
}

fn hit(page: CachedPage) -> Response {
    let mut response = page.body.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&page.content_type) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(CACHE_STATUS_HEADER, HeaderValue::from_static("HIT"));
    response
}
