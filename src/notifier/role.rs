//! Which role approves a document in its current state, and who holds it.

use opentelemetry::KeyValue;
use tracing::{debug, info};

use super::WorkflowNotifier;
use crate::error::Result;
use crate::host::Host;
use crate::model::{Document, TransitionRule};
use crate::telemetry::metrics;

impl<H: Host> WorkflowNotifier<H> {
    /// Resolve the approving role for the document's current workflow state.
    ///
    /// Approval rows are tried in order. A row whose condition is false is
    /// skipped; otherwise its literal role wins, then its role formula. When
    /// nothing resolves, the failure is logged and `None` returned.
    pub async fn resolve_role(&self, doc: &Document) -> Result<Option<String>> {
        let Some(state) = doc.workflow_state.as_deref() else {
            return Ok(None);
        };

        let rows = self
            .host
            .approval_transitions(&doc.doctype, state, &self.config.approve_action)
            .await?;
        if rows.is_empty() {
            self.report_unresolved(doc, state, "no approval transition found")
                .await;
            return Ok(None);
        }

        for row in &rows {
            if !self.condition_holds(row, doc).await {
                continue;
            }
            if let Some(role) = row.literal_role() {
                debug!(document = %doc, role, "role from transition");
                return Ok(Some(role.to_string()));
            }
            let Some(expr) = row.role_formula.as_deref() else {
                continue;
            };
            match self.evaluator.eval_role(expr, doc) {
                Ok(Some(role)) => {
                    debug!(document = %doc, role = %role, "role from formula");
                    return Ok(Some(role));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.log_failure("Workflow role formula", &format!("{doc}: {e}"))
                        .await;
                }
            }
        }

        self.report_unresolved(doc, state, "no role resolved from transitions")
            .await;
        Ok(None)
    }

    /// Emails of the users who hold `role`.
    pub async fn approver_emails(&self, role: &str) -> Result<Vec<String>> {
        let mut users = self.host.users_with_role(role).await?;
        users.sort();
        users.dedup();
        Ok(users)
    }

    /// Whether a transition row applies to the document. Rows without a
    /// condition always apply; a failing condition counts as false.
    pub(super) async fn condition_holds(&self, row: &TransitionRule, doc: &Document) -> bool {
        let Some(expr) = row.condition.as_deref() else {
            return true;
        };
        match self.evaluator.eval_condition(expr, doc) {
            Ok(holds) => holds,
            Err(e) => {
                self.log_failure("Workflow transition condition", &format!("{doc}: {e}"))
                    .await;
                false
            }
        }
    }

    async fn report_unresolved(&self, doc: &Document, state: &str, reason: &str) {
        info!(document = %doc, state, reason, "approving role unresolved");
        metrics::role_unresolved().add(1, &[KeyValue::new("doctype", doc.doctype.clone())]);
        self.log_failure(
            "Workflow role not found",
            &format!("{doc} in state {state}: {reason}"),
        )
        .await;
    }
}
