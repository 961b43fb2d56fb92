//! Canonical to-do upsert.
//!
//! Invariant: after an upsert no to-do of the (document, user) pair is open
//! except the canonical one, tagged with the requested state. Which record
//! survives among several is decided by [`CanonicalPolicy`]; the others are
//! closed, never deleted. A canonical to-do already closed for the same
//! state is refreshed but not reopened.

use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::debug;

use super::{WorkflowNotifier, template};
use crate::config::CanonicalPolicy;
use crate::error::Result;
use crate::host::Host;
use crate::model::{NewToDo, ToDo, TodoFilter, TodoId, TodoPriority, TodoStatus, TodoUpdate};
use crate::telemetry::metrics;

/// Who must act on which document, and for which state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoAssignment {
    pub user: String,
    pub reference_type: String,
    pub reference_name: String,
    pub state: String,
    pub action: String,
    pub assigned_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// No to-do existed for the pair.
    Created,
    /// A to-do for the same state was refreshed.
    Refreshed,
    /// A to-do for another state was retagged and reopened.
    Promoted,
}

impl UpsertAction {
    fn as_str(self) -> &'static str {
        match self {
            UpsertAction::Created => "created",
            UpsertAction::Refreshed => "refreshed",
            UpsertAction::Promoted => "promoted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoUpsert {
    /// The canonical to-do.
    pub id: TodoId,
    pub action: UpsertAction,
    /// Other open to-dos of the pair that were closed.
    pub closed: usize,
}

impl<H: Host> WorkflowNotifier<H> {
    /// Ensure one canonical to-do for the assignment and close the rest.
    ///
    /// The canonical record is open afterwards unless it is a to-do for the
    /// same state that was already closed.
    pub async fn upsert_todo(&self, assignment: &TodoAssignment) -> Result<TodoUpsert> {
        let description = template::todo_description(
            &assignment.action,
            &assignment.reference_type,
            &assignment.reference_name,
            &assignment.state,
        );
        let pair = TodoFilter::for_document(&assignment.reference_type, &assignment.reference_name)
            .allocated_to(&assignment.user);

        let same_state = self
            .host
            .find_todos(&pair.clone().workflow_state(&assignment.state))
            .await?;

        let (id, action) = if let Some(canonical) = self.pick_canonical(&same_state) {
            let reopen = canonical.status != TodoStatus::Closed;
            self.host
                .update_todo(
                    canonical.id,
                    &TodoUpdate {
                        description: Some(description),
                        // A to-do closed for this very state stays closed.
                        status: reopen.then_some(TodoStatus::Open),
                        workflow_state: None,
                    },
                )
                .await?;
            (canonical.id, UpsertAction::Refreshed)
        } else {
            let any_state = self.host.find_todos(&pair).await?;
            match self.pick_canonical(&any_state) {
                Some(canonical) => {
                    self.host
                        .update_todo(
                            canonical.id,
                            &TodoUpdate {
                                description: Some(description),
                                status: Some(TodoStatus::Open),
                                workflow_state: Some(assignment.state.clone()),
                            },
                        )
                        .await?;
                    (canonical.id, UpsertAction::Promoted)
                }
                None => {
                    let created = self
                        .host
                        .insert_todo(&NewToDo {
                            reference_type: assignment.reference_type.clone(),
                            reference_name: assignment.reference_name.clone(),
                            allocated_to: assignment.user.clone(),
                            description,
                            status: TodoStatus::Open,
                            priority: TodoPriority::Medium,
                            date: Utc::now().date_naive(),
                            assigned_by: assignment.assigned_by.clone(),
                            workflow_state: Some(assignment.state.clone()),
                        })
                        .await?;
                    (created.id, UpsertAction::Created)
                }
            }
        };

        let closed = self.close_duplicates(&pair, id).await?;
        metrics::todos_upserted().add(1, &[KeyValue::new("action", action.as_str())]);
        debug!(
            user = %assignment.user,
            reference = %assignment.reference_name,
            state = %assignment.state,
            todo = %id,
            action = action.as_str(),
            closed,
            "to-do upserted"
        );
        Ok(TodoUpsert { id, action, closed })
    }

    /// Pick the canonical record from a creation-ordered list.
    fn pick_canonical<'a>(&self, todos: &'a [ToDo]) -> Option<&'a ToDo> {
        match self.config.canonical_policy {
            CanonicalPolicy::OldestWins => todos.first(),
            CanonicalPolicy::NewestWins => todos.last(),
        }
    }

    async fn close_duplicates(&self, pair: &TodoFilter, keep: TodoId) -> Result<usize> {
        let open = self
            .host
            .find_todos(&pair.clone().status(TodoStatus::Open))
            .await?;
        let mut closed = 0;
        for todo in open.iter().filter(|t| t.id != keep) {
            self.host.update_todo(todo.id, &TodoUpdate::close()).await?;
            closed += 1;
        }
        if closed > 0 {
            metrics::todos_closed().add(closed as u64, &[KeyValue::new("reason", "duplicate")]);
        }
        Ok(closed)
    }
}
