//! Background jobs on pgmq.
//!
//! Each job queue name maps to a pgmq queue. The message body carries the
//! job's dotted method path and its keyword arguments; the host's worker
//! reads and archives them.

use crate::error::Result;
use crate::model::JobRequest;
use serde::{Deserialize, Serialize};

/// Message body stored in a pgmq queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub method: String,
    pub kwargs: serde_json::Value,
}

/// A job read back from a queue.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub msg_id: i64,
    pub read_ct: i32,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
    pub job: JobMessage,
}

impl super::Db {
    /// Create a pgmq queue (idempotent).
    pub async fn create_queue(&self, queue_name: &str) -> Result<()> {
        sqlx::query("SELECT pgmq.create($1)")
            .bind(queue_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Send a job to its queue, creating the queue first. Returns the
    /// message ID.
    pub async fn send_job(&self, job: &JobRequest) -> Result<i64> {
        self.create_queue(&job.queue).await?;
        let payload = serde_json::to_value(JobMessage {
            method: job.method.clone(),
            kwargs: job.kwargs.clone(),
        })?;
        let row: (i64,) = sqlx::query_as("SELECT pgmq.send($1, $2, 0)")
            .bind(&job.queue)
            .bind(&payload)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Read the next job from a queue, hiding it for `vt_seconds`.
    pub async fn read_job(&self, queue_name: &str, vt_seconds: i32) -> Result<Option<QueuedJob>> {
        let row = sqlx::query_as::<_, (i64, i32, chrono::DateTime<chrono::Utc>, serde_json::Value)>(
            "SELECT msg_id, read_ct, enqueued_at, message FROM pgmq.read($1, $2, 1)",
        )
        .bind(queue_name)
        .bind(vt_seconds)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(msg_id, read_ct, enqueued_at, message)| -> Result<QueuedJob> {
            Ok(QueuedJob {
                msg_id,
                read_ct,
                enqueued_at,
                job: serde_json::from_value(message)?,
            })
        })
        .transpose()
    }

    /// Archive a handled job (moves to archive table, kept for audit).
    pub async fn archive_job(&self, queue_name: &str, msg_id: i64) -> Result<()> {
        sqlx::query("SELECT pgmq.archive($1, $2)")
            .bind(queue_name)
            .bind(msg_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
