//! Request logging.
//!
//! One span per request, named after the matched route rather than the raw
//! path so that `/posts/{id}` pages group together. The auth layer fills in
//! `admin` for editor requests; the response line carries the page cache
//! verdict.
//!
//! ```text
//! INFO request{method=GET route=/posts/{id} uri=/posts/12-hello}: status=200 cache=HIT latency_ms=1 finished
//! INFO request{method=POST route=/api/posts/{id}/publish uri=/api/posts/12/publish admin=Editor laptop}: status=200 cache=- latency_ms=14 finished
//! ```

use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, MakeSpan, OnResponse, TraceLayer};
use tracing::{Span, field};

use super::page_cache::CACHE_STATUS_HEADER;

pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, DefaultOnRequest, ResponseLine>;

pub fn layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(ResponseLine)
}

#[derive(Debug, Clone, Copy)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or("unmatched");

        tracing::info_span!(
            "request",
            method = %request.method(),
            route,
            uri = %request.uri(),
            admin = field::Empty,
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseLine;

impl<B> OnResponse<B> for ResponseLine {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        tracing::info!(
            status = response.status().as_u16(),
            cache = cache_status(response),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "finished"
        );
    }
}

/// `HIT`/`MISS` for page-cached routes, `-` for everything else.
fn cache_status<B>(response: &Response<B>) -> &str {
    response
        .headers()
        .get(CACHE_STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
