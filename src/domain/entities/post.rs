//! Post entity: authored content and its derived values.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::slug::slugify;

/// Content type of a post, derived from its tags and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PostKind {
    Link,
    Tweet,
    #[serde(rename = "originalPost")]
    Original,
}

impl PostKind {
    /// Tag that marks a post as a tweet-style note.
    pub const TWEET_TAG: &'static str = "tweet";

    /// Classifies a post from a snapshot of its tags and `original_content` flag.
    ///
    /// The tweet tag always wins over the original-content flag; link is the default.
    pub fn classify<S: AsRef<str>>(tags: &[S], original_content: bool) -> Self {
        if tags.iter().any(|t| t.as_ref() == Self::TWEET_TAG) {
            return PostKind::Tweet;
        }

        if original_content {
            return PostKind::Original;
        }

        PostKind::Link
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Link => "link",
            PostKind::Tweet => "tweet",
            PostKind::Original => "originalPost",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            PostKind::Link => "🔗",
            PostKind::Tweet => "🐦",
            PostKind::Original => "🌟",
        }
    }
}

/// A blog post.
///
/// `tags` is the tag set as loaded together with the row. Anything that must
/// reflect the latest persisted tags goes through
/// [`crate::application::services::PostService::classify`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub external_url: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub published: bool,
    pub original_content: bool,
    pub send_automated_tweet: bool,
    pub author_twitter_handle: Option<String>,
    pub submitted_by_user_id: Option<i64>,
    /// Twitter handle of the submitting user, joined from `users`.
    pub submitter_twitter_handle: Option<String>,
    pub series_slug: Option<String>,
    pub preview_secret: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn kind(&self) -> PostKind {
        PostKind::classify(&self.tags, self.original_content)
    }

    /// Unpublished with a publish date at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.published && self.publish_date.is_some_and(|d| d <= now)
    }

    pub fn is_part_of_series(&self) -> bool {
        self.series_slug.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// `"{id}-{slug}"` path segment used in public URLs.
    pub fn id_slug(&self) -> String {
        let slug = slugify(&self.title);
        if slug.is_empty() {
            self.id.to_string()
        } else {
            format!("{}-{}", self.id, slug)
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/posts/{}", base_url.trim_end_matches('/'), self.id_slug())
    }

    pub fn preview_url(&self, base_url: &str) -> String {
        format!(
            "{}?preview_secret={}",
            self.url(base_url),
            self.preview_secret
        )
    }

    /// URL used when promoting the post: the external URL if any, else the post itself.
    pub fn promotional_url(&self, base_url: &str) -> String {
        match self.external_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.url(base_url),
        }
    }

    pub fn author_twitter_handle(&self) -> Option<&str> {
        self.author_twitter_handle
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| {
                self.submitter_twitter_handle
                    .as_deref()
                    .filter(|h| !h.is_empty())
            })
    }

    /// Short announcement text used for social cross-posting.
    ///
    /// ```text
    /// 🌟 Title (by @handle)
    /// https://example.com/posts/1-title
    /// #php #laravel
    /// ```
    pub fn announcement(&self, base_url: &str) -> String {
        let hashtags = self
            .tags
            .iter()
            .map(|tag| format!("#{}", tag.replace(' ', "")))
            .collect::<Vec<_>>()
            .join(" ");

        let by = self
            .author_twitter_handle()
            .map(|handle| format!(" (by @{handle})"))
            .unwrap_or_default();

        format!(
            "{} {}{}\n{}\n{}",
            self.kind().emoji(),
            self.title,
            by,
            self.promotional_url(base_url),
            hashtags
        )
    }

    /// Document handed to the search index. Unpublished posts are not indexed.
    pub fn search_document(&self) -> Option<SearchDocument> {
        if !self.published {
            return None;
        }

        Some(SearchDocument {
            id: self.id,
            title: self.title.clone(),
            kind: self.kind(),
            external_url: self.external_url.clone(),
            publish_date: self.publish_date,
            original_content: self.original_content,
            series_slug: self.series_slug.clone(),
            tags: self.tags.clone(),
        })
    }

    /// Access rule for the public post page.
    ///
    /// Admins always see the post, a matching preview secret unlocks drafts,
    /// everyone else only sees published posts.
    pub fn is_viewable_by(&self, is_admin: bool, preview_secret: Option<&str>) -> bool {
        if is_admin {
            return true;
        }

        if preview_secret.is_some_and(|s| s == self.preview_secret) {
            return true;
        }

        self.published
    }
}

/// Searchable projection of a published post. The body text is omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    pub id: i64,
    pub title: String,
    pub kind: PostKind,
    pub external_url: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub original_content: bool,
    pub series_slug: Option<String>,
    pub tags: Vec<String>,
}

/// Editor input for creating or updating a post.
///
/// `tags_text` is the raw comma-separated tag list as typed by the editor.
#[derive(Debug, Clone, Default)]
pub struct PostAttributes {
    pub title: String,
    pub text: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub published: bool,
    pub original_content: bool,
    pub external_url: Option<String>,
    pub tags_text: String,
    pub series_slug: Option<String>,
    pub send_automated_tweet: bool,
}

/// Validated set of editable columns written by a create or update.
///
/// `published` is intentionally absent: the flag only flips through the
/// publish transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChanges {
    pub title: String,
    pub text: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub original_content: bool,
    pub external_url: Option<String>,
    pub series_slug: Option<String>,
    pub send_automated_tweet: bool,
    pub tags: Vec<String>,
}

/// Input for inserting a new post row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub changes: PostChanges,
    pub preview_secret: String,
    pub author_twitter_handle: Option<String>,
    pub submitted_by_user_id: Option<i64>,
}

#[cfg(test)]
pub(crate) fn sample_post(id: i64, title: &str) -> Post {
    let now = Utc::now();
    Post {
        id,
        title: title.to_string(),
        text: "Body".to_string(),
        external_url: None,
        publish_date: None,
        published: false,
        original_content: false,
        send_automated_tweet: true,
        author_twitter_handle: None,
        submitted_by_user_id: None,
        submitter_twitter_handle: None,
        series_slug: None,
        preview_secret: "s3cr3tT0k3".to_string(),
        tags: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
