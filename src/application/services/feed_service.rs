//! Atom feeds of published posts.

use askama::Template;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::formatting::{formatted_text_with_external_url, formatted_title};
use crate::domain::entities::Post;
use crate::domain::repositories::{PostFilter, PostRepository};
use crate::error::AppError;

/// Number of entries in every feed.
pub const FEED_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    All,
    Php,
    Originals,
}

impl FeedKind {
    fn filter(self) -> PostFilter {
        match self {
            FeedKind::All => PostFilter::all(),
            FeedKind::Php => PostFilter::tagged("php"),
            FeedKind::Originals => PostFilter::originals(),
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            FeedKind::All => "/feed",
            FeedKind::Php => "/feed/php",
            FeedKind::Originals => "/feed/originals",
        }
    }

    fn title(self) -> &'static str {
        match self {
            FeedKind::All => "All posts",
            FeedKind::Php => "PHP posts",
            FeedKind::Originals => "Original content",
        }
    }
}

/// One feed entry, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub updated: String,
    pub link: String,
}

#[derive(Template)]
#[template(path = "atom.xml", escape = "html")]
struct AtomTemplate<'a> {
    feed_url: String,
    title: &'a str,
    updated: String,
    author_name: &'a str,
    author_email: &'a str,
    entries: &'a [FeedItem],
}

pub struct FeedService<P: PostRepository> {
    posts: Arc<P>,
    base_url: String,
    author_name: String,
    author_email: String,
}

impl<P: PostRepository> FeedService<P> {
    pub fn new(
        posts: Arc<P>,
        base_url: impl Into<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
    ) -> Self {
        Self {
            posts,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            author_name: author_name.into(),
            author_email: author_email.into(),
        }
    }

    /// The most recent published posts of a feed as entries.
    pub async fn items(&self, kind: FeedKind) -> Result<Vec<FeedItem>, AppError> {
        let posts = self.posts.list_published(kind.filter(), 0, FEED_SIZE).await?;
        let mut series_by_slug: HashMap<String, Vec<Post>> = HashMap::new();
        let mut items = Vec::with_capacity(posts.len());

        for post in &posts {
            let series: &[Post] = match post.series_slug.as_deref().filter(|s| !s.is_empty()) {
                Some(slug) => {
                    if !series_by_slug.contains_key(slug) {
                        let entries = self.posts.series(slug).await?;
                        series_by_slug.insert(slug.to_string(), entries);
                    }
                    series_by_slug.get(slug).map(Vec::as_slice).unwrap_or_default()
                }
                None => &[],
            };

            items.push(self.item(post, series));
        }

        Ok(items)
    }

    /// Renders a feed as an Atom document.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database or template errors.
    pub async fn render_atom(&self, kind: FeedKind) -> Result<String, AppError> {
        let entries = self.items(kind).await?;
        let updated = entries
            .first()
            .map(|e| e.updated.clone())
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        AtomTemplate {
            feed_url: format!("{}{}", self.base_url, kind.path()),
            title: kind.title(),
            updated,
            author_name: &self.author_name,
            author_email: &self.author_email,
            entries: &entries,
        }
        .render()
        .map_err(|e| AppError::internal("Feed rendering failed", json!({ "reason": e.to_string() })))
    }

    fn item(&self, post: &Post, series: &[Post]) -> FeedItem {
        FeedItem {
            id: format!("{}/{}", self.base_url, post.id),
            title: formatted_title(post),
            summary: formatted_text_with_external_url(post, series, &self.base_url),
            updated: post
                .publish_date
                .unwrap_or(post.updated_at)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            link: post.url(&self.base_url),
        }
    }
}
