//! [`Host`] over the Postgres tables.

use chrono::{DateTime, Utc};

use super::Db;
use crate::error::Result;
use crate::host::Host;
use crate::model::*;

impl Host for Db {
    async fn get_document(&self, doctype: &str, name: &str) -> Result<Option<Document>> {
        self.load_document(doctype, name).await
    }

    async fn approval_transitions(
        &self,
        doctype: &str,
        state: &str,
        action: &str,
    ) -> Result<Vec<TransitionRule>> {
        self.find_transitions(doctype, state, action).await
    }

    async fn users_with_role(&self, role: &str) -> Result<Vec<String>> {
        self.find_users_with_role(role).await
    }

    async fn share_exists(&self, doctype: &str, name: &str, user: &str) -> Result<bool> {
        self.has_share(doctype, name, user).await
    }

    async fn add_share(&self, share: &DocShare) -> Result<()> {
        self.insert_share(share).await
    }

    async fn find_todos(&self, filter: &TodoFilter) -> Result<Vec<ToDo>> {
        self.list_todos(filter).await
    }

    async fn insert_todo(&self, todo: &NewToDo) -> Result<ToDo> {
        self.create_todo(todo).await
    }

    async fn update_todo(&self, id: TodoId, update: &TodoUpdate) -> Result<()> {
        self.patch_todo(id, update).await
    }

    async fn send_mail(&self, email: &OutgoingEmail) -> Result<()> {
        self.queue_email(email).await.map(|_| ())
    }

    async fn notification_exists_since(
        &self,
        user: &str,
        doctype: &str,
        name: &str,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        self.has_recent_notification(user, doctype, name, subject, since)
            .await
    }

    async fn insert_notification(&self, notification: &NotificationLog) -> Result<()> {
        self.create_notification(notification).await
    }

    async fn workflow_name(&self, doctype: &str) -> Result<Option<String>> {
        self.active_workflow(doctype).await
    }

    async fn transitions_from(&self, workflow: &str, state: &str) -> Result<Vec<TransitionRule>> {
        self.find_transitions_from(workflow, state).await
    }

    async fn enqueue_job(&self, job: &JobRequest) -> Result<()> {
        self.send_job(job).await.map(|_| ())
    }

    async fn log_error(&self, title: &str, message: &str) -> Result<()> {
        self.append_error_log(title, message).await
    }
}
