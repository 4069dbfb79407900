//! PostgreSQL implementation of post repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{NewPost, Post, PostChanges};
use crate::domain::repositories::{PostFilter, PostRepository};
use crate::error::AppError;

/// Shared projection: post columns, the submitter's handle and the tag names.
const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text, p.external_url, p.publish_date, p.published,
        p.original_content, p.send_automated_tweet, p.author_twitter_handle,
        p.submitted_by_user_id, u.twitter_handle AS submitter_twitter_handle,
        p.series_slug, p.preview_secret, p.created_at, p.updated_at,
        ARRAY(
            SELECT t.name
            FROM post_tag pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = p.id
            ORDER BY t.name
        ) AS tags
    FROM posts p
    LEFT JOIN users u ON u.id = p.submitted_by_user_id
"#;

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    text: String,
    external_url: Option<String>,
    publish_date: Option<DateTime<Utc>>,
    published: bool,
    original_content: bool,
    send_automated_tweet: bool,
    author_twitter_handle: Option<String>,
    submitted_by_user_id: Option<i64>,
    submitter_twitter_handle: Option<String>,
    series_slug: Option<String>,
    preview_secret: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tags: Vec<String>,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Post {
            id: r.id,
            title: r.title,
            text: r.text,
            external_url: r.external_url,
            publish_date: r.publish_date,
            published: r.published,
            original_content: r.original_content,
            send_automated_tweet: r.send_automated_tweet,
            author_twitter_handle: r.author_twitter_handle,
            submitted_by_user_id: r.submitted_by_user_id,
            submitter_twitter_handle: r.submitter_twitter_handle,
            series_slug: r.series_slug,
            preview_secret: r.preview_secret,
            tags: r.tags,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL repository for posts and the post/tag pivot.
///
/// Tag names are upserted into `tags`; the pivot is rewritten on every save
/// so the stored set always equals the submitted one.
pub struct PgPostRepository {
    pool: Arc<PgPool>,
}

impl PgPostRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Post>, AppError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn sync_tags(
        tx: &mut Transaction<'_, Postgres>,
        post_id: i64,
        tags: &[String],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM post_tag WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut **tx)
            .await?;

        if tags.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO tags (name)
            SELECT UNNEST($1::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(tags)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO post_tag (post_id, tag_id)
            SELECT $1, id FROM tags WHERE name = ANY($2)
            "#,
        )
        .bind(post_id)
        .bind(tags)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    fn missing(id: i64) -> AppError {
        AppError::not_found("Post not found", json!({ "id": id }))
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, AppError> {
        let mut tx = self.pool.begin().await?;
        let c = &new_post.changes;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (
                title, text, external_url, publish_date, original_content,
                send_automated_tweet, series_slug, preview_secret,
                author_twitter_handle, submitted_by_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&c.title)
        .bind(&c.text)
        .bind(&c.external_url)
        .bind(c.publish_date)
        .bind(c.original_content)
        .bind(c.send_automated_tweet)
        .bind(&c.series_slug)
        .bind(&new_post.preview_secret)
        .bind(&new_post.author_twitter_handle)
        .bind(new_post.submitted_by_user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::sync_tags(&mut tx, id, &c.tags).await?;
        let post = Self::fetch(&mut *tx, id)
            .await?
            .ok_or_else(|| Self::missing(id))?;

        tx.commit().await?;
        Ok(post)
    }

    async fn find(&self, id: i64) -> Result<Option<Post>, AppError> {
        Self::fetch(self.pool.as_ref(), id).await
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2,
                text = $3,
                external_url = $4,
                publish_date = $5,
                original_content = $6,
                send_automated_tweet = $7,
                series_slug = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.text)
        .bind(&changes.external_url)
        .bind(changes.publish_date)
        .bind(changes.original_content)
        .bind(changes.send_automated_tweet)
        .bind(&changes.series_slug)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Self::missing(id));
        }

        Self::sync_tags(&mut tx, id, &changes.tags).await?;
        let post = Self::fetch(&mut *tx, id)
            .await?
            .ok_or_else(|| Self::missing(id))?;

        tx.commit().await?;
        Ok(post)
    }

    async fn mark_published(
        &self,
        id: i64,
        publish_date: DateTime<Utc>,
    ) -> Result<Option<Post>, AppError> {
        let flipped: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET published = TRUE, publish_date = $2, updated_at = NOW()
            WHERE id = $1 AND published = FALSE
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(publish_date)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let post = Self::fetch(self.pool.as_ref(), id)
            .await?
            .ok_or_else(|| Self::missing(id))?;

        Ok(flipped.map(|_| post))
    }

    async fn tags(&self, id: i64) -> Result<Vec<String>, AppError> {
        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name
            FROM post_tag pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(tags)
    }

    async fn series(&self, series_slug: &str) -> Result<Vec<Post>, AppError> {
        let sql = format!("{POST_SELECT} WHERE p.series_slug = $1 ORDER BY p.id ASC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(series_slug)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_published(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>, AppError> {
        let sql = format!(
            r#"{POST_SELECT}
            WHERE p.published = TRUE
              AND ($1 = FALSE OR p.original_content = TRUE)
              AND ($2::text IS NULL OR EXISTS (
                    SELECT 1
                    FROM post_tag pt
                    JOIN tags t ON t.id = pt.tag_id
                    WHERE pt.post_id = p.id AND t.name = $2
              ))
            ORDER BY p.publish_date DESC NULLS LAST, p.id DESC
            OFFSET $3
            LIMIT $4
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(filter.original_only)
            .bind(filter.tag)
            .bind(offset)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_scheduled(&self) -> Result<Vec<Post>, AppError> {
        let sql = format!(
            "{POST_SELECT} WHERE p.published = FALSE AND p.publish_date IS NOT NULL \
             ORDER BY p.publish_date ASC, p.id ASC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }
}
