use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Outbox-backed notifier for the best-effort emails fired on order-state
/// transitions. Every notification is first persisted to the
/// `notifications` table, then delivery to the relay is attempted once.
/// Rows that fail delivery stay in the table with status 'failed' so an
/// operator can inspect and replay them; callers never see the failure.
#[derive(Clone)]
pub struct Notifier {
    relay_url: Option<String>,
    client: Arc<Client>,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

impl Notifier {
    pub fn new(relay_url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            relay_url,
            client: Arc::new(client),
        })
    }

    /// Queue a notification and try to deliver it. Never returns an error:
    /// a failed notification must not roll back the transition it announces.
    pub async fn send(&self, pool: &DbPool, user_id: Uuid, email: &str, subject: &str, body: &str) {
        let row_id = match self.enqueue(pool, user_id, email, subject, body).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = %err, %user_id, "failed to enqueue notification");
                return;
            }
        };

        let Some(relay_url) = self.relay_url.as_deref() else {
            tracing::debug!(%row_id, "no notifier relay configured, leaving notification queued");
            return;
        };

        let message = RelayMessage {
            to: email,
            subject,
            body,
        };
        let delivered = match self.client.post(relay_url).json(&message).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), %row_id, "notifier relay rejected message");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, %row_id, "notifier relay unreachable");
                false
            }
        };

        if let Err(err) = self.mark(pool, row_id, delivered).await {
            tracing::warn!(error = %err, %row_id, "failed to update notification status");
        }
    }

    async fn enqueue(
        &self,
        pool: &DbPool,
        user_id: Uuid,
        email: &str,
        subject: &str,
        body: &str,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, email, subject, body, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(email)
        .bind(subject)
        .bind(body)
        .execute(pool)
        .await?;
        Ok(id)
    }

    async fn mark(&self, pool: &DbPool, id: Uuid, delivered: bool) -> AppResult<()> {
        if delivered {
            sqlx::query("UPDATE notifications SET status = 'sent', sent_at = now() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        } else {
            sqlx::query("UPDATE notifications SET status = 'failed' WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        }
        Ok(())
    }
}
