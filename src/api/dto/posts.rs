//! DTOs for post endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::formatting::{formatted_text, formatted_title};
use crate::domain::entities::{Post, PostAttributes, PostKind};

fn default_true() -> bool {
    true
}

/// Editor payload for creating or updating a post.
///
/// Blank fields and malformed URLs are reported by the service, so only
/// lengths are checked here.
#[derive(Debug, Deserialize, Validate)]
pub struct PostRequest {
    #[validate(length(max = 255))]
    pub title: String,

    pub text: String,

    pub publish_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub published: bool,

    #[serde(default)]
    pub original_content: bool,

    #[validate(length(max = 2048))]
    pub external_url: Option<String>,

    /// Comma-separated tag names, e.g. `"PHP, Laravel"`.
    #[serde(default)]
    pub tags_text: String,

    #[validate(length(max = 255))]
    pub series_slug: Option<String>,

    #[serde(default = "default_true")]
    pub send_automated_tweet: bool,

    /// Only read on create.
    #[validate(length(max = 50))]
    pub author_twitter_handle: Option<String>,

    /// Only read on create.
    pub submitted_by_user_id: Option<i64>,
}

impl PostRequest {
    pub fn attributes(&self) -> PostAttributes {
        PostAttributes {
            title: self.title.clone(),
            text: self.text.clone(),
            publish_date: self.publish_date,
            published: self.published,
            original_content: self.original_content,
            external_url: self.external_url.clone().filter(|u| !u.trim().is_empty()),
            tags_text: self.tags_text.clone(),
            series_slug: self.series_slug.clone(),
            send_automated_tweet: self.send_automated_tweet,
        }
    }
}

/// Admin view of a post.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub kind: &'static str,
    pub published: bool,
    pub publish_date: Option<DateTime<Utc>>,
    pub original_content: bool,
    pub external_url: Option<String>,
    pub series_slug: Option<String>,
    pub send_automated_tweet: bool,
    pub tags: Vec<String>,
    pub url: String,
    pub preview_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn from_post(post: Post, base_url: &str) -> Self {
        Self {
            kind: post.kind().as_str(),
            url: post.url(base_url),
            preview_url: post.preview_url(base_url),
            id: post.id,
            title: post.title,
            published: post.published,
            publish_date: post.publish_date,
            original_content: post.original_content,
            external_url: post.external_url,
            series_slug: post.series_slug,
            send_automated_tweet: post.send_automated_tweet,
            tags: post.tags,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostKindResponse {
    pub id: i64,
    pub kind: &'static str,
    pub emoji: &'static str,
}

impl PostKindResponse {
    pub fn new(id: i64, kind: PostKind) -> Self {
        Self {
            id,
            kind: kind.as_str(),
            emoji: kind.emoji(),
        }
    }
}

/// Reader view of a post with its rendered body.
#[derive(Debug, Serialize)]
pub struct PublicPostResponse {
    pub id: i64,
    pub title: String,
    pub heading: String,
    pub kind: &'static str,
    pub html: String,
    pub url: String,
    pub external_url: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub author_twitter_handle: Option<String>,
    pub series: Vec<SeriesEntry>,
}

impl PublicPostResponse {
    pub fn new(post: &Post, series: &[Post], base_url: &str) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            heading: formatted_title(post),
            kind: post.kind().as_str(),
            html: formatted_text(post, series, base_url),
            url: post.url(base_url),
            external_url: post.external_url.clone(),
            publish_date: post.publish_date,
            tags: post.tags.clone(),
            author_twitter_handle: post.author_twitter_handle().map(str::to_string),
            series: series
                .iter()
                .map(|p| SeriesEntry::new(p, post.id, base_url))
                .collect(),
        }
    }
}

/// One post of a series as listed next to its siblings.
#[derive(Debug, Serialize)]
pub struct SeriesEntry {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub current: bool,
}

impl SeriesEntry {
    pub fn new(post: &Post, current_id: i64, base_url: &str) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            url: post.url(base_url),
            current: post.id == current_id,
        }
    }
}

/// Entry of a public post listing.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub kind: &'static str,
    pub url: String,
    pub external_url: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl PostSummary {
    pub fn from_post(post: Post, base_url: &str) -> Self {
        Self {
            kind: post.kind().as_str(),
            url: post.url(base_url),
            id: post.id,
            title: post.title,
            external_url: post.external_url,
            publish_date: post.publish_date,
            tags: post.tags,
        }
    }
}

/// Query string of the public post page.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub preview_secret: Option<String>,
}
