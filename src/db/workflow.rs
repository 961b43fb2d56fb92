//! Workflow metadata, roles, and document snapshots.

use crate::error::Result;
use crate::model::{Document, TransitionRule};

const TRANSITION_COLUMNS: &str =
    "t.workflow, w.document_type, t.state, t.action, t.next_state, t.allowed, t.role_formula, t.condition, t.idx";

impl super::Db {
    /// Load a document snapshot.
    pub async fn load_document(&self, doctype: &str, name: &str) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT doctype, name, owner, workflow_state, status, fields
             FROM documents WHERE doctype = $1 AND name = $2",
        )
        .bind(doctype)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DocumentRow::into_document))
    }

    /// Insert or replace a document snapshot.
    pub async fn upsert_document(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            "INSERT INTO documents (doctype, name, owner, workflow_state, status, fields)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (doctype, name) DO UPDATE
             SET owner = EXCLUDED.owner, workflow_state = EXCLUDED.workflow_state,
                 status = EXCLUDED.status, fields = EXCLUDED.fields",
        )
        .bind(&doc.doctype)
        .bind(&doc.name)
        .bind(&doc.owner)
        .bind(&doc.workflow_state)
        .bind(&doc.status)
        .bind(serde_json::Value::Object(doc.fields.clone()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Name of the active workflow for a doctype.
    pub async fn active_workflow(&self, doctype: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM workflows WHERE document_type = $1 AND is_active LIMIT 1",
        )
        .bind(doctype)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(name,)| name))
    }

    /// Approval rows of the doctype's active workflow leaving `state`.
    pub async fn find_transitions(
        &self,
        doctype: &str,
        state: &str,
        action: &str,
    ) -> Result<Vec<TransitionRule>> {
        let rows: Vec<TransitionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSITION_COLUMNS}
             FROM workflow_transitions t
             JOIN workflows w ON w.name = t.workflow
             WHERE w.document_type = $1 AND w.is_active AND t.state = $2 AND t.action = $3
             ORDER BY t.idx, t.id"
        ))
        .bind(doctype)
        .bind(state)
        .bind(action)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransitionRow::into_rule).collect())
    }

    /// Every transition of `workflow` leaving `state`.
    pub async fn find_transitions_from(
        &self,
        workflow: &str,
        state: &str,
    ) -> Result<Vec<TransitionRule>> {
        let rows: Vec<TransitionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSITION_COLUMNS}
             FROM workflow_transitions t
             JOIN workflows w ON w.name = t.workflow
             WHERE t.workflow = $1 AND t.state = $2
             ORDER BY t.idx, t.id"
        ))
        .bind(workflow)
        .bind(state)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransitionRow::into_rule).collect())
    }

    /// Emails of enabled users holding `role`.
    pub async fn find_users_with_role(&self, role: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT u.email
             FROM users u
             JOIN user_roles r ON r.user_email = u.email
             WHERE r.role = $1 AND u.enabled
             ORDER BY u.email",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct DocumentRow {
    doctype: String,
    name: String,
    owner: String,
    workflow_state: Option<String>,
    status: Option<String>,
    fields: serde_json::Value,
}

impl DocumentRow {
    fn into_document(self) -> Document {
        let fields = match self.fields {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Document {
            doctype: self.doctype,
            name: self.name,
            owner: self.owner,
            workflow_state: self.workflow_state,
            status: self.status,
            fields,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransitionRow {
    workflow: String,
    document_type: String,
    state: String,
    action: String,
    next_state: String,
    allowed: Option<String>,
    role_formula: Option<String>,
    condition: Option<String>,
    idx: i32,
}

impl TransitionRow {
    fn into_rule(self) -> TransitionRule {
        TransitionRule {
            workflow: self.workflow,
            doctype: self.document_type,
            state: self.state,
            action: self.action,
            next_state: self.next_state,
            allowed: self.allowed,
            role_formula: self.role_formula,
            condition: self.condition,
            idx: self.idx,
        }
    }
}
