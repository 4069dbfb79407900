//! DTOs for link submission and moderation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::pagination::PageParams;
use crate::domain::entities::{Link, LinkStatus};

/// A link submitted on behalf of a registered user.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitLinkRequest {
    pub user_id: i64,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    #[validate(length(max = 5000))]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub text: Option<String>,
    pub status: LinkStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub submitter_name: Option<String>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            user_id: link.user_id,
            title: link.title,
            url: link.url,
            text: link.text,
            status: link.status,
            publish_date: link.publish_date,
            created_at: link.created_at,
            submitter_name: link.submitter_name,
        }
    }
}

/// Query parameters of the moderation queue listing.
#[derive(Debug, Deserialize)]
pub struct LinkListQuery {
    pub status: Option<LinkStatus>,

    #[serde(flatten)]
    pub pagination: PageParams,
}
