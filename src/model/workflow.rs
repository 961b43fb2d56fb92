//! Workflow transition rows.

use serde::{Deserialize, Serialize};

/// One row of a workflow's transition table: from `state`, performing
/// `action` moves the document to `next_state`, gated by a role.
///
/// The role is either the literal `allowed` column or, when that is
/// empty, a formula evaluated against the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub workflow: String,
    pub doctype: String,
    pub state: String,
    pub action: String,
    pub next_state: String,
    #[serde(default)]
    pub allowed: Option<String>,
    #[serde(default)]
    pub role_formula: Option<String>,
    /// Boolean formula; the row applies only when it evaluates true.
    #[serde(default)]
    pub condition: Option<String>,
    /// Row order within the workflow.
    #[serde(default)]
    pub idx: i32,
}

impl TransitionRule {
    pub fn new(
        workflow: impl Into<String>,
        doctype: impl Into<String>,
        state: impl Into<String>,
        action: impl Into<String>,
        next_state: impl Into<String>,
    ) -> Self {
        Self {
            workflow: workflow.into(),
            doctype: doctype.into(),
            state: state.into(),
            action: action.into(),
            next_state: next_state.into(),
            allowed: None,
            role_formula: None,
            condition: None,
            idx: 0,
        }
    }

    pub fn allowed(mut self, role: impl Into<String>) -> Self {
        self.allowed = Some(role.into());
        self
    }

    pub fn role_formula(mut self, expr: impl Into<String>) -> Self {
        self.role_formula = Some(expr.into());
        self
    }

    pub fn condition(mut self, expr: impl Into<String>) -> Self {
        self.condition = Some(expr.into());
        self
    }

    pub fn idx(mut self, idx: i32) -> Self {
        self.idx = idx;
        self
    }

    /// Literal role, ignoring blank values.
    pub fn literal_role(&self) -> Option<&str> {
        self.allowed
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty())
    }
}
