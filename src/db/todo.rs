//! To-do rows: filtered reads, inserts, partial updates.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{NewToDo, ToDo, TodoFilter, TodoId, TodoUpdate};

impl super::Db {
    /// To-dos matching the filter, oldest first.
    pub async fn list_todos(&self, filter: &TodoFilter) -> Result<Vec<ToDo>> {
        let rows: Vec<TodoRow> = sqlx::query_as(
            "SELECT id, reference_type, reference_name, allocated_to, description, status, priority, date, assigned_by, workflow_state, created_at, updated_at
             FROM todos
             WHERE reference_type = $1 AND reference_name = $2
             AND ($3::text IS NULL OR allocated_to = $3)
             AND ($4::text IS NULL OR workflow_state = $4)
             AND ($5::text IS NULL OR status = $5)
             ORDER BY created_at ASC, id ASC",
        )
        .bind(&filter.reference_type)
        .bind(&filter.reference_name)
        .bind(&filter.allocated_to)
        .bind(&filter.workflow_state)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TodoRow::try_into_todo).collect()
    }

    pub async fn create_todo(&self, new: &NewToDo) -> Result<ToDo> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        sqlx::query(
            "INSERT INTO todos (id, reference_type, reference_name, allocated_to, description, status, priority, date, assigned_by, workflow_state, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)",
        )
        .bind(id)
        .bind(&new.reference_type)
        .bind(&new.reference_name)
        .bind(&new.allocated_to)
        .bind(&new.description)
        .bind(new.status.as_str())
        .bind(new.priority.as_str())
        .bind(new.date)
        .bind(&new.assigned_by)
        .bind(&new.workflow_state)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(ToDo {
            id: TodoId(id),
            reference_type: new.reference_type.clone(),
            reference_name: new.reference_name.clone(),
            allocated_to: new.allocated_to.clone(),
            description: new.description.clone(),
            status: new.status,
            priority: new.priority,
            date: new.date,
            assigned_by: new.assigned_by.clone(),
            workflow_state: new.workflow_state.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Unset fields keep their value.
    pub async fn patch_todo(&self, id: TodoId, update: &TodoUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let rows_affected = sqlx::query(
            "UPDATE todos
             SET description = COALESCE($1, description),
                 status = COALESCE($2, status),
                 workflow_state = COALESCE($3, workflow_state),
                 updated_at = now()
             WHERE id = $4",
        )
        .bind(&update.description)
        .bind(update.status.map(|s| s.as_str()))
        .bind(&update.workflow_state)
        .bind(id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("to-do {id}")));
        }
        Ok(())
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct TodoRow {
    id: Uuid,
    reference_type: String,
    reference_name: String,
    allocated_to: String,
    description: String,
    status: String,
    priority: String,
    date: chrono::NaiveDate,
    assigned_by: Option<String>,
    workflow_state: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TodoRow {
    fn try_into_todo(self) -> Result<ToDo> {
        Ok(ToDo {
            id: TodoId(self.id),
            reference_type: self.reference_type,
            reference_name: self.reference_name,
            allocated_to: self.allocated_to,
            description: self.description,
            status: self.status.parse()?,
            priority: self.priority.parse()?,
            date: self.date,
            assigned_by: self.assigned_by,
            workflow_state: self.workflow_state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
