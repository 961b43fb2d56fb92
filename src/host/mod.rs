//! The host framework as seen by the notifier.
//!
//! The workflow engine, permission model, persistence, mail transport and
//! job queue all live in the host. The notifier reaches them only through
//! [`Host`], so the pipeline can run against Postgres ([`crate::db::Db`])
//! or entirely in memory ([`memory::MemoryHost`]).

pub mod fixture;
pub mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::*;

/// Typed collaborator interface onto the host.
///
/// Implementations are expected to be individually atomic per call; the
/// notifier takes no locks of its own.
pub trait Host: Send + Sync {
    /// Load a document snapshot.
    fn get_document(
        &self,
        doctype: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Transition rows of the active workflow for `doctype` leaving `state`
    /// via `action`, in row order.
    fn approval_transitions(
        &self,
        doctype: &str,
        state: &str,
        action: &str,
    ) -> impl Future<Output = Result<Vec<TransitionRule>>> + Send;

    /// Emails of enabled users holding `role`, distinct and sorted.
    fn users_with_role(&self, role: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn share_exists(
        &self,
        doctype: &str,
        name: &str,
        user: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Grant access. Must be a no-op when the share already exists.
    fn add_share(&self, share: &DocShare) -> impl Future<Output = Result<()>> + Send;

    /// To-dos matching `filter`, oldest first.
    fn find_todos(&self, filter: &TodoFilter) -> impl Future<Output = Result<Vec<ToDo>>> + Send;

    fn insert_todo(&self, todo: &NewToDo) -> impl Future<Output = Result<ToDo>> + Send;

    fn update_todo(
        &self,
        id: TodoId,
        update: &TodoUpdate,
    ) -> impl Future<Output = Result<()>> + Send;

    fn send_mail(&self, email: &OutgoingEmail) -> impl Future<Output = Result<()>> + Send;

    /// Whether a notification with this exact user, document and subject
    /// was created at or after `since`.
    fn notification_exists_since(
        &self,
        user: &str,
        doctype: &str,
        name: &str,
        subject: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn insert_notification(
        &self,
        notification: &NotificationLog,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Name of the active workflow for `doctype`, if any.
    fn workflow_name(&self, doctype: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Every transition of `workflow` leaving `state`, in row order.
    fn transitions_from(
        &self,
        workflow: &str,
        state: &str,
    ) -> impl Future<Output = Result<Vec<TransitionRule>>> + Send;

    fn enqueue_job(&self, job: &JobRequest) -> impl Future<Output = Result<()>> + Send;

    /// Persist a non-fatal failure to the host's error log.
    fn log_error(&self, title: &str, message: &str) -> impl Future<Output = Result<()>> + Send;
}
