//! TOML fixtures for the in-memory host.
//!
//! ```toml
//! [[workflow]]
//! doctype = "Purchase Order"
//! name = "PO Approval"
//!
//! [[transition]]
//! workflow = "PO Approval"
//! doctype = "Purchase Order"
//! state = "Manager Review"
//! action = "Approve"
//! next_state = "Approved"
//! allowed = "Manager"
//!
//! [[user]]
//! email = "alice@example.com"
//! roles = ["Manager"]
//!
//! [[document]]
//! doctype = "Purchase Order"
//! name = "PO-0001"
//! owner = "clerk@example.com"
//! workflow_state = "Manager Review"
//! fields = { grand_total = 1200 }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::memory::MemoryHost;
use crate::error::{Error, Result};
use crate::model::{Document, TransitionRule};

#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default, rename = "workflow")]
    pub workflows: Vec<WorkflowEntry>,
    #[serde(default, rename = "transition")]
    pub transitions: Vec<TransitionRule>,
    #[serde(default, rename = "user")]
    pub users: Vec<UserEntry>,
    #[serde(default, rename = "document")]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowEntry {
    pub doctype: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Fixture {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("bad fixture: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad fixture {}: {e}", path.display())))
    }

    /// Build a host seeded with this fixture.
    pub fn into_host(self) -> MemoryHost {
        let mut host = MemoryHost::new();
        for workflow in self.workflows {
            host = host.with_workflow(workflow.doctype, workflow.name);
        }
        for transition in self.transitions {
            host = host.with_transition(transition);
        }
        for user in self.users {
            let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
            host = host.with_user_enabled(user.email, &roles, user.enabled);
        }
        for document in self.documents {
            host = host.with_document(document);
        }
        host
    }
}
