//! Workflow notifier: the service behind the document lifecycle hooks.
//!
//! When a document enters a workflow state, the notifier resolves the role
//! that approves it, shares the document with every user holding that role,
//! keeps one canonical to-do per (document, user), mails and notifies them,
//! and asks the host to send workflow-action emails. When the state moves on,
//! the document is rejected, or it is submitted, stale to-dos are closed.
//!
//! Hook entry points never fail: errors are logged to `tracing` and the
//! host's error log, and reported back in [`HookReport::error`].

mod cleanup;
mod pipeline;
mod role;
pub mod template;
mod todo;

pub use pipeline::{PipelineReport, RecipientFailure};
pub use todo::{TodoAssignment, TodoUpsert, UpsertAction};

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, Span, info, warn};

use crate::config::NotifierConfig;
use crate::error::Result;
use crate::formula::FormulaEvaluator;
use crate::host::Host;
use crate::model::Document;
use crate::telemetry::hook::{record_state_change, start_hook_span};
use crate::telemetry::metrics;

/// Why a hook did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The document is itself a to-do; acting on it would recurse.
    TodoDocument,
    /// The document carries no workflow state.
    NoWorkflowState,
    /// The document was already rejected before this save.
    AlreadyRejected,
}

/// What a hook invocation did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookReport {
    pub skipped: Option<SkipReason>,
    pub pipeline: Option<PipelineReport>,
    pub todos_closed: usize,
    /// Failure caught at the hook boundary, already logged.
    pub error: Option<String>,
}

impl HookReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// The notifier service. Holds its host collaborator; no global state.
pub struct WorkflowNotifier<H> {
    host: H,
    config: NotifierConfig,
    evaluator: FormulaEvaluator,
}

impl<H: Host> WorkflowNotifier<H> {
    pub fn new(host: H, config: NotifierConfig) -> Self {
        Self {
            host,
            config,
            evaluator: FormulaEvaluator::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    // -- hooks --------------------------------------------------------------

    /// After-save hook. `previous` is the snapshot before the save, if any.
    pub async fn on_update(&self, previous: Option<&Document>, doc: &Document) -> HookReport {
        if doc.is_todo() {
            return HookReport::skipped(SkipReason::TodoDocument);
        }
        let span = start_hook_span("on_update", &doc.doctype, &doc.name);
        let started = Instant::now();
        let result = self
            .handle_update(previous, doc, &span)
            .instrument(span.clone())
            .await;
        self.finish("on_update", doc, started, result).await
    }

    /// After-submit hook: close every open to-do on the document.
    pub async fn on_submit(&self, doc: &Document) -> HookReport {
        if doc.is_todo() {
            return HookReport::skipped(SkipReason::TodoDocument);
        }
        let span = start_hook_span("on_submit", &doc.doctype, &doc.name);
        let started = Instant::now();
        let result = self.handle_submit(doc).instrument(span).await;
        self.finish("on_submit", doc, started, result).await
    }

    /// After a user applied a workflow `action`; `doc` is the resulting
    /// snapshot.
    pub async fn on_workflow_action(&self, doc: &Document, action: &str) -> HookReport {
        if doc.is_todo() {
            return HookReport::skipped(SkipReason::TodoDocument);
        }
        let span = start_hook_span("on_workflow_action", &doc.doctype, &doc.name);
        let started = Instant::now();
        let result = self
            .handle_workflow_action(doc, action)
            .instrument(span)
            .await;
        self.finish("on_workflow_action", doc, started, result)
            .await
    }

    async fn handle_update(
        &self,
        previous: Option<&Document>,
        doc: &Document,
        span: &Span,
    ) -> Result<HookReport> {
        let mut report = HookReport::default();

        if self.is_rejection(previous, doc) {
            info!(document = %doc, "document rejected, closing to-dos");
            report.todos_closed = self
                .close_all_todos(doc, &self.config.rejected_state, "rejected")
                .await?;
            return Ok(report);
        }
        // Re-saving a rejected document must not revive its to-dos.
        if doc.is_in(&self.config.rejected_state) {
            report.skipped = Some(SkipReason::AlreadyRejected);
            return Ok(report);
        }

        let Some(state) = doc.workflow_state.as_deref() else {
            report.skipped = Some(SkipReason::NoWorkflowState);
            return Ok(report);
        };

        let previous_state = previous.and_then(|p| p.workflow_state.as_deref());
        let changed = previous_state != Some(state);
        if changed {
            record_state_change(span, previous_state, Some(state));
        }

        // Stale to-dos are closed even if notifying the new approvers failed.
        let pipeline = self.notify_approvers(doc).await;
        if changed {
            report.todos_closed = self.close_stale_todos(doc, state).await?;
        }
        report.pipeline = Some(pipeline?);
        Ok(report)
    }

    async fn handle_submit(&self, doc: &Document) -> Result<HookReport> {
        let tag = doc.workflow_state.as_deref().unwrap_or("Submitted");
        let closed = self.close_all_todos(doc, tag, "submitted").await?;
        info!(document = %doc, closed, "document submitted");
        Ok(HookReport {
            todos_closed: closed,
            ..HookReport::default()
        })
    }

    async fn handle_workflow_action(&self, doc: &Document, action: &str) -> Result<HookReport> {
        info!(document = %doc, action, "workflow action applied");
        let mut report = HookReport::default();

        if doc.is_in(&self.config.rejected_state) {
            report.todos_closed = self
                .close_all_todos(doc, &self.config.rejected_state, "rejected")
                .await?;
            return Ok(report);
        }

        let Some(state) = doc.workflow_state.as_deref() else {
            report.skipped = Some(SkipReason::NoWorkflowState);
            return Ok(report);
        };

        let pipeline = self.notify_approvers(doc).await;
        report.todos_closed = self.close_stale_todos(doc, state).await?;
        report.pipeline = Some(pipeline?);
        Ok(report)
    }

    /// Hook boundary: record duration, swallow and log any error.
    async fn finish(
        &self,
        hook: &'static str,
        doc: &Document,
        started: Instant,
        result: Result<HookReport>,
    ) -> HookReport {
        metrics::hook_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("hook", hook)],
        );
        match result {
            Ok(report) => report,
            Err(e) => {
                metrics::hook_failures().add(1, &[KeyValue::new("hook", hook)]);
                let message = format!("{doc}: {e}");
                self.log_failure(&format!("Workflow notifier {hook}"), &message)
                    .await;
                HookReport {
                    error: Some(message),
                    ..HookReport::default()
                }
            }
        }
    }

    /// Log a non-fatal failure locally and to the host's error log.
    async fn log_failure(&self, title: &str, message: &str) {
        warn!(title, message, "non-fatal workflow notification failure");
        if let Err(e) = self.host.log_error(title, message).await {
            tracing::error!(title, error = %e, "failed to write host error log");
        }
    }
}
