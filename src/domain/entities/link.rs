//! Link submission entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Moderation state of a submitted link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Pending,
    Approved,
}

impl LinkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LinkStatus::Pending),
            "approved" => Ok(LinkStatus::Approved),
            other => Err(format!("unknown link status '{other}'")),
        }
    }
}

/// A link submitted by a user for inclusion on the blog.
///
/// Submitter name and email are joined from `users` so the approval mail can
/// be addressed without another lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub text: Option<String>,
    pub status: LinkStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
}

impl Link {
    pub fn is_approved(&self) -> bool {
        self.status == LinkStatus::Approved
    }
}

/// Input data for a new submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub text: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_link(id: i64, status: LinkStatus) -> Link {
    Link {
        id,
        user_id: 1,
        title: "Spatie packages".to_string(),
        url: "https://spatie.be/open-source".to_string(),
        text: None,
        status,
        publish_date: None,
        created_at: Utc::now(),
        submitter_name: Some("Jane".to_string()),
        submitter_email: Some("jane@example.com".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        assert_eq!("pending".parse::<LinkStatus>(), Ok(LinkStatus::Pending));
        assert_eq!("approved".parse::<LinkStatus>(), Ok(LinkStatus::Approved));
        assert!("rejected".parse::<LinkStatus>().is_err());
        assert_eq!(LinkStatus::Approved.to_string(), "approved");
    }

    #[test]
    fn test_is_approved() {
        assert!(!sample_link(1, LinkStatus::Pending).is_approved());
        assert!(sample_link(1, LinkStatus::Approved).is_approved());
    }
}
