//! Outbound notifications produced by the workflow.

use serde::{Deserialize, Serialize};

/// A message queued for asynchronous delivery.
///
/// Serialized with a `kind` discriminator so webhook receivers can route it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Social cross-post announcing a freshly published post.
    PostPublished {
        post_id: i64,
        title: String,
        url: String,
        announcement: String,
    },
    /// Mail to the submitter of an approved link.
    LinkApproved {
        link_id: i64,
        recipient: String,
        title: String,
        url: String,
    },
    /// Mail to the site owner about a new submission.
    LinkSubmitted {
        link_id: i64,
        recipient: String,
        title: String,
        url: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PostPublished { .. } => "post_published",
            Notification::LinkApproved { .. } => "link_approved",
            Notification::LinkSubmitted { .. } => "link_submitted",
        }
    }

    /// Mail recipient, if this notification is a mail.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Notification::PostPublished { .. } => None,
            Notification::LinkApproved { recipient, .. }
            | Notification::LinkSubmitted { recipient, .. } => Some(recipient),
        }
    }
}
