//! Snapshot of a business document as seen by lifecycle hooks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Doctype of the host's own task records. Hooks ignore these.
pub const TODO_DOCTYPE: &str = "ToDo";

/// A business record with a workflow. Mutated by the host only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doctype: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Remaining field values, exposed read-only to formulas.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(
        doctype: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            doctype: doctype.into(),
            name: name.into(),
            owner: owner.into(),
            workflow_state: None,
            status: None,
            fields: Map::new(),
        }
    }

    pub fn workflow_state(mut self, state: impl Into<String>) -> Self {
        self.workflow_state = Some(state.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is_todo(&self) -> bool {
        self.doctype == TODO_DOCTYPE
    }

    /// Whether either the status or the workflow state equals `state`.
    pub fn is_in(&self, state: &str) -> bool {
        self.status.as_deref() == Some(state) || self.workflow_state.as_deref() == Some(state)
    }

    /// Field map handed to the formula evaluator. Header fields win over
    /// same-named entries in `fields`.
    pub fn context(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("doctype".into(), Value::String(self.doctype.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("owner".into(), Value::String(self.owner.clone()));
        map.insert(
            "workflow_state".into(),
            self.workflow_state.clone().map_or(Value::Null, Value::String),
        );
        map.insert(
            "status".into(),
            self.status.clone().map_or(Value::Null, Value::String),
        );
        Value::Object(map)
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.doctype, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_overrides_shadowed_header_fields() {
        let doc = Document::new("Purchase Order", "PO-0001", "clerk@x")
            .workflow_state("Manager Review")
            .field("name", "spoofed")
            .field("grand_total", 1200);

        let ctx = doc.context();
        assert_eq!(ctx["name"], json!("PO-0001"));
        assert_eq!(ctx["grand_total"], json!(1200));
        assert_eq!(ctx["status"], Value::Null);
    }

    #[test]
    fn is_in_checks_status_and_state() {
        let doc = Document::new("Leave Application", "HR-LAP-1", "a@x").status("Rejected");
        assert!(doc.is_in("Rejected"));
        assert!(!doc.is_in("Approved"));
    }
}
