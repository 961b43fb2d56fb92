//! In-memory host for tests and dry runs.
//!
//! Holds workflow configuration, users and documents, and records every side
//! effect the notifier asks for so callers can inspect them afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::Host;
use crate::error::{Error, Result};
use crate::model::*;

#[derive(Debug, Clone)]
struct MemoryUser {
    enabled: bool,
    roles: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// doctype -> active workflow name
    workflows: HashMap<String, String>,
    transitions: Vec<TransitionRule>,
    users: BTreeMap<String, MemoryUser>,
    documents: Vec<Document>,
    shares: Vec<DocShare>,
    todos: Vec<ToDo>,
    mails: Vec<OutgoingEmail>,
    notifications: Vec<NotificationLog>,
    jobs: Vec<JobRequest>,
    errors: Vec<ErrorLogEntry>,
    failing_recipients: HashSet<String>,
    failing_todo_reads: bool,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    // -- configuration ------------------------------------------------------

    /// Make `workflow` the active workflow for `doctype`.
    pub fn with_workflow(mut self, doctype: impl Into<String>, workflow: impl Into<String>) -> Self {
        self.state_mut()
            .workflows
            .insert(doctype.into(), workflow.into());
        self
    }

    /// Add a transition row. Registers its workflow as active for the
    /// doctype when no workflow is set yet.
    pub fn with_transition(mut self, rule: TransitionRule) -> Self {
        let state = self.state_mut();
        state
            .workflows
            .entry(rule.doctype.clone())
            .or_insert_with(|| rule.workflow.clone());
        state.transitions.push(rule);
        self
    }

    pub fn with_user(self, email: impl Into<String>, roles: &[&str]) -> Self {
        self.with_user_enabled(email, roles, true)
    }

    pub fn with_user_enabled(
        mut self,
        email: impl Into<String>,
        roles: &[&str],
        enabled: bool,
    ) -> Self {
        self.state_mut().users.insert(
            email.into(),
            MemoryUser {
                enabled,
                roles: roles.iter().map(|r| r.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_document(self, doc: Document) -> Self {
        self.put_document(doc);
        self
    }

    /// Make every mail addressed to `email` fail.
    pub fn failing_mail_to(mut self, email: impl Into<String>) -> Self {
        self.state_mut().failing_recipients.insert(email.into());
        self
    }

    /// Make every to-do read fail, as if the host's database were down.
    pub fn failing_todo_reads(mut self) -> Self {
        self.state_mut().failing_todo_reads = true;
        self
    }

    // -- direct mutation ----------------------------------------------------

    /// Insert or replace a document snapshot.
    pub fn put_document(&self, doc: Document) {
        let mut state = self.state();
        state
            .documents
            .retain(|d| !(d.doctype == doc.doctype && d.name == doc.name));
        state.documents.push(doc);
    }

    /// Store a to-do as-is, bypassing the notifier.
    pub fn seed_todo(&self, todo: ToDo) {
        self.state().todos.push(todo);
    }

    /// Shift every recorded notification back in time.
    pub fn age_notifications(&self, by: chrono::Duration) {
        for notification in &mut self.state().notifications {
            notification.created_at -= by;
        }
    }

    // -- inspection ---------------------------------------------------------

    pub fn todos(&self) -> Vec<ToDo> {
        self.state().todos.clone()
    }

    /// Open to-dos referencing the document, oldest first.
    pub fn open_todos(&self, doctype: &str, name: &str) -> Vec<ToDo> {
        let filter = TodoFilter::for_document(doctype, name).status(TodoStatus::Open);
        sorted(self.state().todos.iter().filter(|t| filter.matches(t)))
    }

    pub fn shares(&self) -> Vec<DocShare> {
        self.state().shares.clone()
    }

    pub fn mails(&self) -> Vec<OutgoingEmail> {
        self.state().mails.clone()
    }

    pub fn notifications(&self) -> Vec<NotificationLog> {
        self.state().notifications.clone()
    }

    pub fn jobs(&self) -> Vec<JobRequest> {
        self.state().jobs.clone()
    }

    pub fn errors(&self) -> Vec<ErrorLogEntry> {
        self.state().errors.clone()
    }
}

fn sorted<'a>(todos: impl Iterator<Item = &'a ToDo>) -> Vec<ToDo> {
    let mut todos: Vec<ToDo> = todos.cloned().collect();
    // Stable: equal timestamps keep insertion order.
    todos.sort_by_key(|t| t.created_at);
    todos
}

impl Host for MemoryHost {
    async fn get_document(&self, doctype: &str, name: &str) -> Result<Option<Document>> {
        Ok(self
            .state()
            .documents
            .iter()
            .find(|d| d.doctype == doctype && d.name == name)
            .cloned())
    }

    async fn approval_transitions(
        &self,
        doctype: &str,
        state: &str,
        action: &str,
    ) -> Result<Vec<TransitionRule>> {
        let guard = self.state();
        let Some(workflow) = guard.workflows.get(doctype) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<TransitionRule> = guard
            .transitions
            .iter()
            .filter(|t| {
                &t.workflow == workflow
                    && t.doctype == doctype
                    && t.state == state
                    && t.action == action
            })
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.idx);
        Ok(rows)
    }

    async fn users_with_role(&self, role: &str) -> Result<Vec<String>> {
        Ok(self
            .state()
            .users
            .iter()
            .filter(|(_, user)| user.enabled && user.roles.contains(role))
            .map(|(email, _)| email.clone())
            .collect())
    }

    async fn share_exists(&self, doctype: &str, name: &str, user: &str) -> Result<bool> {
        Ok(self
            .state()
            .shares
            .iter()
            .any(|s| s.doctype == doctype && s.name == name && s.user == user))
    }

    async fn add_share(&self, share: &DocShare) -> Result<()> {
        let mut state = self.state();
        let exists = state
            .shares
            .iter()
            .any(|s| s.doctype == share.doctype && s.name == share.name && s.user == share.user);
        if !exists {
            state.shares.push(share.clone());
        }
        Ok(())
    }

    async fn find_todos(&self, filter: &TodoFilter) -> Result<Vec<ToDo>> {
        let state = self.state();
        if state.failing_todo_reads {
            return Err(Error::Other("to-do table unavailable".to_string()));
        }
        Ok(sorted(state.todos.iter().filter(|t| filter.matches(t))))
    }

    async fn insert_todo(&self, new: &NewToDo) -> Result<ToDo> {
        let now = Utc::now();
        let todo = ToDo {
            id: TodoId::new(),
            reference_type: new.reference_type.clone(),
            reference_name: new.reference_name.clone(),
            allocated_to: new.allocated_to.clone(),
            description: new.description.clone(),
            status: new.status,
            priority: new.priority,
            date: new.date,
            assigned_by: new.assigned_by.clone(),
            workflow_state: new.workflow_state.clone(),
            created_at: now,
            updated_at: now,
        };
        self.state().todos.push(todo.clone());
        Ok(todo)
    }

    async fn update_todo(&self, id: TodoId, update: &TodoUpdate) -> Result<()> {
        let mut state = self.state();
        let todo = state
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("to-do {id}")))?;
        update.apply(todo);
        todo.updated_at = Utc::now();
        Ok(())
    }

    async fn send_mail(&self, email: &OutgoingEmail) -> Result<()> {
        let mut state = self.state();
        if let Some(bad) = email
            .recipients
            .iter()
            .find(|r| state.failing_recipients.contains(*r))
        {
            return Err(Error::Other(format!("mail transport rejected {bad}")));
        }
        state.mails.push(email.clone());
        Ok(())
    }

    async fn notification_exists_since(
        &self,
        user: &str,
        doctype: &str,
        name: &str,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.state().notifications.iter().any(|n| {
            n.for_user == user
                && n.document_type == doctype
                && n.document_name == name
                && n.subject == subject
                && n.created_at >= since
        }))
    }

    async fn insert_notification(&self, notification: &NotificationLog) -> Result<()> {
        self.state().notifications.push(notification.clone());
        Ok(())
    }

    async fn workflow_name(&self, doctype: &str) -> Result<Option<String>> {
        Ok(self.state().workflows.get(doctype).cloned())
    }

    async fn transitions_from(&self, workflow: &str, state: &str) -> Result<Vec<TransitionRule>> {
        let mut rows: Vec<TransitionRule> = self
            .state()
            .transitions
            .iter()
            .filter(|t| t.workflow == workflow && t.state == state)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.idx);
        Ok(rows)
    }

    async fn enqueue_job(&self, job: &JobRequest) -> Result<()> {
        self.state().jobs.push(job.clone());
        Ok(())
    }

    async fn log_error(&self, title: &str, message: &str) -> Result<()> {
        self.state().errors.push(ErrorLogEntry {
            title: title.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}
