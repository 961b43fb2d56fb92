//! Per-approver side effects: share, to-do, mail, in-app notification.

use chrono::Utc;
use opentelemetry::KeyValue;
use serde_json::json;
use tracing::{debug, info, warn};

use super::todo::{TodoAssignment, TodoUpsert};
use super::{WorkflowNotifier, template};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::model::{DocShare, Document, JobRequest, NotificationLog, OutgoingEmail};
use crate::telemetry::metrics;

/// What one pipeline run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    /// `None` when no approving role resolved; nothing else happened then.
    pub role: Option<String>,
    pub approvers: Vec<String>,
    pub shares_created: usize,
    pub todos: Vec<TodoUpsert>,
    pub emails_sent: usize,
    pub notifications_created: usize,
    pub notifications_suppressed: usize,
    pub failures: Vec<RecipientFailure>,
    pub action_job_enqueued: bool,
}

/// A recipient whose side effects stopped part-way. Already logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientFailure {
    pub user: String,
    pub error: String,
}

impl<H: Host> WorkflowNotifier<H> {
    /// Notify everyone who must approve the document in its current state.
    ///
    /// One approver's failure is logged and the loop moves on. Afterwards
    /// the host's workflow-action email job is enqueued when the state has
    /// applicable outgoing transitions.
    pub async fn notify_approvers(&self, doc: &Document) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        let Some(state) = doc.workflow_state.as_deref() else {
            return Ok(report);
        };
        let Some(role) = self.resolve_role(doc).await? else {
            return Ok(report);
        };

        let approvers = self.approver_emails(&role).await?;
        if approvers.is_empty() {
            self.log_failure(
                "Workflow approvers not found",
                &format!("{doc} in state {state}: no enabled user holds role {role}"),
            )
            .await;
        }

        for user in &approvers {
            if let Err(e) = self.notify_approver(doc, state, user, &mut report).await {
                metrics::hook_failures().add(1, &[KeyValue::new("hook", "notify_approver")]);
                self.log_failure(
                    "Workflow notification failed",
                    &format!("{doc} for {user}: {e}"),
                )
                .await;
                report.failures.push(RecipientFailure {
                    user: user.clone(),
                    error: e.to_string(),
                });
            }
        }

        info!(
            document = %doc,
            state,
            role = %role,
            approvers = approvers.len(),
            failures = report.failures.len(),
            "approvers notified"
        );

        report.action_job_enqueued = self.enqueue_action_emails(doc, state, &approvers).await?;
        report.role = Some(role);
        report.approvers = approvers;
        Ok(report)
    }

    async fn notify_approver(
        &self,
        doc: &Document,
        state: &str,
        user: &str,
        report: &mut PipelineReport,
    ) -> Result<()> {
        let existed = self
            .host
            .share_exists(&doc.doctype, &doc.name, user)
            .await?;
        self.host
            .add_share(&DocShare::submit_level(&doc.doctype, &doc.name, user))
            .await?;
        if existed {
            metrics::shares().add(1, &[KeyValue::new("result", "existing")]);
        } else {
            report.shares_created += 1;
            metrics::shares().add(1, &[KeyValue::new("result", "created")]);
        }

        let upsert = self
            .upsert_todo(&TodoAssignment {
                user: user.to_string(),
                reference_type: doc.doctype.clone(),
                reference_name: doc.name.clone(),
                state: state.to_string(),
                action: self.config.approve_action.clone(),
                assigned_by: Some(doc.owner.clone()),
            })
            .await?;
        report.todos.push(upsert);

        let subject = template::approval_subject(&doc.doctype, &doc.name);

        if self.config.send_email {
            let url = template::document_url(&self.config.site_url, &doc.doctype, &doc.name);
            self.host
                .send_mail(&OutgoingEmail {
                    recipients: vec![user.to_string()],
                    subject: subject.clone(),
                    html: template::approval_email_body(&doc.doctype, &doc.name, state, &url),
                    reference_doctype: Some(doc.doctype.clone()),
                    reference_name: Some(doc.name.clone()),
                    delayed: self.config.defer_email,
                })
                .await?;
            report.emails_sent += 1;
            metrics::emails_sent().add(1, &[]);
        }

        if self.config.notification_log {
            if self.create_notification(doc, user, &subject).await? {
                report.notifications_created += 1;
            } else {
                report.notifications_suppressed += 1;
            }
        }

        debug!(document = %doc, user, "approver notified");
        Ok(())
    }

    /// Create an in-app notification unless an identical one exists inside
    /// the dedup window. Returns whether one was created.
    async fn create_notification(&self, doc: &Document, user: &str, subject: &str) -> Result<bool> {
        let window = chrono::Duration::from_std(self.config.notification_dedup_window)
            .map_err(|e| Error::Config(format!("notification dedup window: {e}")))?;
        let now = Utc::now();

        if self
            .host
            .notification_exists_since(user, &doc.doctype, &doc.name, subject, now - window)
            .await?
        {
            metrics::notifications().add(1, &[KeyValue::new("result", "suppressed")]);
            return Ok(false);
        }

        self.host
            .insert_notification(&NotificationLog {
                for_user: user.to_string(),
                from_user: Some(doc.owner.clone()),
                subject: subject.to_string(),
                document_type: doc.doctype.clone(),
                document_name: doc.name.clone(),
                created_at: now,
            })
            .await?;
        metrics::notifications().add(1, &[KeyValue::new("result", "created")]);
        Ok(true)
    }

    /// Hand the host's workflow-action email job to the background queue.
    /// Skipped when the doctype has no workflow or no transition applies.
    async fn enqueue_action_emails(
        &self,
        doc: &Document,
        state: &str,
        approvers: &[String],
    ) -> Result<bool> {
        let Some(workflow) = self.host.workflow_name(&doc.doctype).await? else {
            debug!(document = %doc, "no active workflow, skipping action emails");
            return Ok(false);
        };

        let mut actions = Vec::new();
        for transition in self.host.transitions_from(&workflow, state).await? {
            if self.condition_holds(&transition, doc).await {
                actions.push(json!({
                    "action": transition.action,
                    "next_state": transition.next_state,
                    "allowed": transition.allowed,
                }));
            }
        }
        if actions.is_empty() {
            debug!(document = %doc, state, "no further transitions");
            return Ok(false);
        }

        let job = JobRequest {
            method: self.config.action_email_job.clone(),
            queue: self.config.action_email_queue.clone(),
            kwargs: json!({
                "doctype": doc.doctype,
                "name": doc.name,
                "workflow": workflow,
                "state": state,
                "users": approvers,
                "actions": actions,
            }),
        };
        if let Err(e) = self.host.enqueue_job(&job).await {
            warn!(document = %doc, error = %e, "failed to enqueue action emails");
            return Err(e);
        }
        metrics::jobs_enqueued().add(1, &[KeyValue::new("queue", job.queue.clone())]);
        Ok(true)
    }
}
