//! Append-only audit log for borrow lifecycle events

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Pool, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::enums::BorrowStatus,
};

/// One audit entry per committed creation or transition
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuditEntry {
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub actor_id: Uuid,
    pub from_status: Option<BorrowStatus>,
    pub to_status: BorrowStatus,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

/// Append-only sink for audit entries
///
/// The dispatcher writes through this trait so its failure isolation can
/// be tested without a database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()>;
}

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List audit entries for a request, oldest first
    pub async fn list_for_request(&self, request_id: Uuid) -> AppResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT request_id, item_id, actor_id, from_status, to_status, note, occurred_at
            FROM borrow_audit_log
            WHERE request_id = $1
            ORDER BY occurred_at
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO borrow_audit_log
                (request_id, item_id, actor_id, from_status, to_status, note, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.request_id)
        .bind(entry.item_id)
        .bind(entry.actor_id)
        .bind(entry.from_status)
        .bind(entry.to_status)
        .bind(&entry.note)
        .bind(entry.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
