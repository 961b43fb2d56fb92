//! Side effects the notifier asks the host to perform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grants a user access to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocShare {
    pub doctype: String,
    pub name: String,
    pub user: String,
    pub read: bool,
    pub write: bool,
    pub submit: bool,
    pub share: bool,
    /// Let the host announce the share on its own.
    pub notify: bool,
}

impl DocShare {
    /// Read, write and submit access, no re-sharing, no host announcement.
    pub fn submit_level(
        doctype: impl Into<String>,
        name: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            doctype: doctype.into(),
            name: name.into(),
            user: user.into(),
            read: true,
            write: true,
            submit: true,
            share: false,
            notify: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reference_doctype: Option<String>,
    pub reference_name: Option<String>,
    /// Queue for later delivery instead of sending now.
    pub delayed: bool,
}

/// In-app notification shown in a user's bell menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLog {
    pub for_user: String,
    pub from_user: Option<String>,
    pub subject: String,
    pub document_type: String,
    pub document_name: String,
    pub created_at: DateTime<Utc>,
}

/// A background job handed to the host's queue by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Dotted path of the job function on the host.
    pub method: String,
    pub queue: String,
    pub kwargs: serde_json::Value,
}

/// Entry in the host's error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
