//! Closing to-dos when a document moves on.

use opentelemetry::KeyValue;
use tracing::info;

use super::WorkflowNotifier;
use crate::error::Result;
use crate::host::Host;
use crate::model::{Document, TodoFilter, TodoStatus, TodoUpdate};
use crate::telemetry::metrics;

impl<H: Host> WorkflowNotifier<H> {
    /// Whether this save moved the document into the rejected state, via
    /// either its status or its workflow state.
    pub fn is_rejection(&self, previous: Option<&Document>, doc: &Document) -> bool {
        let rejected = Some(self.config.rejected_state.as_str());
        let was_status = previous.and_then(|p| p.status.as_deref());
        let was_state = previous.and_then(|p| p.workflow_state.as_deref());

        (was_status != rejected && doc.status.as_deref() == rejected)
            || (was_state != rejected && doc.workflow_state.as_deref() == rejected)
    }

    /// Close every open to-do on the document not tagged `current_state`.
    pub async fn close_stale_todos(&self, doc: &Document, current_state: &str) -> Result<usize> {
        let open = self.open_todos(doc).await?;
        let mut closed = 0;
        for todo in open
            .iter()
            .filter(|t| t.workflow_state.as_deref() != Some(current_state))
        {
            self.host.update_todo(todo.id, &TodoUpdate::close()).await?;
            closed += 1;
        }
        if closed > 0 {
            metrics::todos_closed().add(closed as u64, &[KeyValue::new("reason", "state_change")]);
            info!(document = %doc, current_state, closed, "stale to-dos closed");
        }
        Ok(closed)
    }

    /// Close every open to-do on the document and retag it with `tag`.
    pub async fn close_all_todos(
        &self,
        doc: &Document,
        tag: &str,
        reason: &'static str,
    ) -> Result<usize> {
        let open = self.open_todos(doc).await?;
        let update = TodoUpdate::close_tagged(tag);
        for todo in &open {
            self.host.update_todo(todo.id, &update).await?;
        }
        if !open.is_empty() {
            metrics::todos_closed().add(open.len() as u64, &[KeyValue::new("reason", reason)]);
            info!(document = %doc, tag, closed = open.len(), "to-dos closed");
        }
        Ok(open.len())
    }

    async fn open_todos(&self, doc: &Document) -> Result<Vec<crate::model::ToDo>> {
        self.host
            .find_todos(&TodoFilter::for_document(&doc.doctype, &doc.name).status(TodoStatus::Open))
            .await
    }
}
