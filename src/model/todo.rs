//! To-do tasks referencing a document.
//!
//! A to-do is keyed conceptually by (reference type, reference name,
//! allocated user). The notifier keeps at most one open, canonical to-do
//! per key; the rest are closed, never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ---------------------------------------------------------------------------
// ToDo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToDo {
    pub id: TodoId,
    pub reference_type: String,
    pub reference_name: String,
    pub allocated_to: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub date: NaiveDate,
    pub assigned_by: Option<String>,
    /// Workflow state the to-do was raised for.
    pub workflow_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Newtype for to-do IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoId(pub Uuid);

impl TodoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

// ---------------------------------------------------------------------------
// Status / Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TodoStatus {
    Open,
    Closed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Open => "Open",
            TodoStatus::Closed => "Closed",
            TodoStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TodoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Open" => Ok(TodoStatus::Open),
            "Closed" => Ok(TodoStatus::Closed),
            "Cancelled" => Ok(TodoStatus::Cancelled),
            other => Err(Error::InvalidValue(format!("to-do status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TodoPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoPriority::Low => "Low",
            TodoPriority::Medium => "Medium",
            TodoPriority::High => "High",
        }
    }
}

impl std::fmt::Display for TodoPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TodoPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Low" => Ok(TodoPriority::Low),
            "Medium" => Ok(TodoPriority::Medium),
            "High" => Ok(TodoPriority::High),
            other => Err(Error::InvalidValue(format!("to-do priority: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Fields for a freshly created to-do. The host assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewToDo {
    pub reference_type: String,
    pub reference_name: String,
    pub allocated_to: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub date: NaiveDate,
    pub assigned_by: Option<String>,
    pub workflow_state: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoUpdate {
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub workflow_state: Option<String>,
}

impl TodoUpdate {
    pub fn close() -> Self {
        Self {
            status: Some(TodoStatus::Closed),
            ..Self::default()
        }
    }

    pub fn close_tagged(state: impl Into<String>) -> Self {
        Self {
            status: Some(TodoStatus::Closed),
            workflow_state: Some(state.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none() && self.workflow_state.is_none()
    }

    /// Apply to an in-memory record.
    pub fn apply(&self, todo: &mut ToDo) {
        if let Some(ref description) = self.description {
            todo.description = description.clone();
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        if let Some(ref state) = self.workflow_state {
            todo.workflow_state = Some(state.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Read filter over to-dos of one document. Optional parts narrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoFilter {
    pub reference_type: String,
    pub reference_name: String,
    pub allocated_to: Option<String>,
    pub workflow_state: Option<String>,
    pub status: Option<TodoStatus>,
}

impl TodoFilter {
    pub fn for_document(reference_type: impl Into<String>, reference_name: impl Into<String>) -> Self {
        Self {
            reference_type: reference_type.into(),
            reference_name: reference_name.into(),
            allocated_to: None,
            workflow_state: None,
            status: None,
        }
    }

    pub fn allocated_to(mut self, user: impl Into<String>) -> Self {
        self.allocated_to = Some(user.into());
        self
    }

    pub fn workflow_state(mut self, state: impl Into<String>) -> Self {
        self.workflow_state = Some(state.into());
        self
    }

    pub fn status(mut self, status: TodoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, todo: &ToDo) -> bool {
        todo.reference_type == self.reference_type
            && todo.reference_name == self.reference_name
            && self
                .allocated_to
                .as_ref()
                .is_none_or(|user| &todo.allocated_to == user)
            && self
                .workflow_state
                .as_ref()
                .is_none_or(|state| todo.workflow_state.as_ref() == Some(state))
            && self.status.is_none_or(|status| todo.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(user: &str, state: &str, status: TodoStatus) -> ToDo {
        let now = Utc::now();
        ToDo {
            id: TodoId::new(),
            reference_type: "Purchase Order".into(),
            reference_name: "PO-1".into(),
            allocated_to: user.into(),
            description: String::new(),
            status,
            priority: TodoPriority::Medium,
            date: now.date_naive(),
            assigned_by: None,
            workflow_state: Some(state.into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn filter_narrows_by_optional_parts() {
        let open = todo("alice@x", "Manager Review", TodoStatus::Open);
        let base = TodoFilter::for_document("Purchase Order", "PO-1");

        assert!(base.matches(&open));
        assert!(base.clone().allocated_to("alice@x").matches(&open));
        assert!(!base.clone().allocated_to("bob@x").matches(&open));
        assert!(!base.clone().workflow_state("Draft").matches(&open));
        assert!(!base.clone().status(TodoStatus::Closed).matches(&open));
        assert!(!TodoFilter::for_document("Purchase Order", "PO-2").matches(&open));
    }

    #[test]
    fn update_only_touches_set_fields() {
        let mut item = todo("alice@x", "Manager Review", TodoStatus::Open);
        item.description = "keep".into();

        TodoUpdate::close_tagged("Rejected").apply(&mut item);

        assert_eq!(item.status, TodoStatus::Closed);
        assert_eq!(item.workflow_state.as_deref(), Some("Rejected"));
        assert_eq!(item.description, "keep");
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [TodoStatus::Open, TodoStatus::Closed, TodoStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<TodoStatus>().unwrap(), status);
        }
        assert!("open".parse::<TodoStatus>().is_err());
    }
}
