//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkStatus, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_SELECT: &str = r#"
    SELECT
        l.id, l.user_id, l.title, l.url, l.text, l.status, l.publish_date, l.created_at,
        u.name AS submitter_name, u.email AS submitter_email
    FROM links l
    LEFT JOIN users u ON u.id = l.user_id
"#;

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    user_id: i64,
    title: String,
    url: String,
    text: Option<String>,
    status: String,
    publish_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    submitter_name: Option<String>,
    submitter_email: Option<String>,
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(r: LinkRow) -> Result<Self, Self::Error> {
        let status = r.status.parse::<LinkStatus>().map_err(|e| {
            AppError::internal("Corrupt link row", json!({ "id": r.id, "reason": e }))
        })?;

        Ok(Link {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            url: r.url,
            text: r.text,
            status,
            publish_date: r.publish_date,
            created_at: r.created_at,
            submitter_name: r.submitter_name,
            submitter_email: r.submitter_email,
        })
    }
}

/// PostgreSQL repository for link submissions.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("{LINK_SELECT} WHERE l.id = $1");
        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Link::try_from).transpose()
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO links (user_id, title, url, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new_link.user_id)
        .bind(&new_link.title)
        .bind(&new_link.url)
        .bind(&new_link.text)
        .fetch_one(self.pool.as_ref())
        .await?;

        self.fetch(id)
            .await?
            .ok_or_else(|| AppError::internal("Inserted link vanished", json!({ "id": id })))
    }

    async fn find(&self, id: i64) -> Result<Option<Link>, AppError> {
        self.fetch(id).await
    }

    async fn mark_approved(
        &self,
        id: i64,
        publish_date: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let flipped: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE links
            SET status = 'approved', publish_date = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(publish_date)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let link = self
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        Ok(flipped.map(|_| link))
    }

    async fn reopen(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET status = 'pending', publish_date = NULL
            WHERE id = $1 AND status = 'approved'
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(
        &self,
        status: Option<LinkStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"{LINK_SELECT}
            WHERE ($1::text IS NULL OR l.status = $1)
            ORDER BY l.created_at DESC, l.id DESC
            OFFSET $2
            LIMIT $3
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(status.map(LinkStatus::as_str))
            .bind(offset)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(Link::try_from).collect()
    }
}
