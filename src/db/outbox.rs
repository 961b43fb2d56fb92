//! Shares, the mail outbox, in-app notifications, and the error log.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{DocShare, NotificationLog, OutgoingEmail};

impl super::Db {
    pub async fn has_share(&self, doctype: &str, name: &str, user: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM doc_shares
                WHERE share_doctype = $1 AND share_name = $2 AND user_email = $3
             )",
        )
        .bind(doctype)
        .bind(name)
        .bind(user)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Insert a share; an existing share for the same user is left alone.
    pub async fn insert_share(&self, share: &DocShare) -> Result<()> {
        sqlx::query(
            "INSERT INTO doc_shares (share_doctype, share_name, user_email, read, write, submit, share, notify)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (share_doctype, share_name, user_email) DO NOTHING",
        )
        .bind(&share.doctype)
        .bind(&share.name)
        .bind(&share.user)
        .bind(share.read)
        .bind(share.write)
        .bind(share.submit)
        .bind(share.share)
        .bind(share.notify)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Queue an email. Delayed mail waits for the mail worker; the rest is
    /// marked for immediate sending.
    pub async fn queue_email(&self, email: &OutgoingEmail) -> Result<i64> {
        let status = if email.delayed { "Not Sent" } else { "Sending" };
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO email_queue (recipients, subject, html, reference_doctype, reference_name, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&email.recipients)
        .bind(&email.subject)
        .bind(&email.html)
        .bind(&email.reference_doctype)
        .bind(&email.reference_name)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn has_recent_notification(
        &self,
        user: &str,
        doctype: &str,
        name: &str,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM notification_logs
                WHERE for_user = $1 AND document_type = $2 AND document_name = $3
                AND subject = $4 AND created_at >= $5
             )",
        )
        .bind(user)
        .bind(doctype)
        .bind(name)
        .bind(subject)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn create_notification(&self, notification: &NotificationLog) -> Result<()> {
        sqlx::query(
            "INSERT INTO notification_logs (for_user, from_user, subject, document_type, document_name, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&notification.for_user)
        .bind(&notification.from_user)
        .bind(&notification.subject)
        .bind(&notification.document_type)
        .bind(&notification.document_name)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn append_error_log(&self, title: &str, message: &str) -> Result<()> {
        sqlx::query("INSERT INTO error_logs (title, message) VALUES ($1, $2)")
            .bind(title)
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
