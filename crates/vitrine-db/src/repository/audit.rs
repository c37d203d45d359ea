//! # Audit Log Repository
//!
//! Append-only trail of who did what. There is no update or delete helper;
//! the raw `db.audit_logs()` delegate remains available for maintenance.

use tracing::debug;

use vitrine_core::{AuditLog, NewAuditLog};

use crate::error::DbResult;
use crate::pool::Database;
use crate::query::{ColumnExt, Direction, FindMany};
use crate::schema::AuditLogColumn;

#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: Database,
}

impl AuditLogRepository {
    pub fn new(db: Database) -> Self {
        AuditLogRepository { db }
    }

    /// Appends one entry.
    pub async fn record(&self, entry: NewAuditLog) -> DbResult<AuditLog> {
        debug!(action = %entry.action, resource = %entry.resource, "Recording audit entry");
        self.db.audit_logs().create(entry).await
    }

    /// Entries about one resource, newest first.
    pub async fn for_resource(&self, resource: &str, resource_id: &str) -> DbResult<Vec<AuditLog>> {
        self.db
            .audit_logs()
            .find_many(
                FindMany::new()
                    .filter(
                        AuditLogColumn::Resource
                            .equals(resource)
                            .and(AuditLogColumn::ResourceId.equals(resource_id)),
                    )
                    .order_by(AuditLogColumn::CreatedAt, Direction::Desc),
            )
            .await
    }

    /// Latest entries by one actor.
    pub async fn by_actor(&self, actor_id: &str, limit: i64) -> DbResult<Vec<AuditLog>> {
        self.db
            .audit_logs()
            .find_many(
                FindMany::new()
                    .filter(AuditLogColumn::ActorId.equals(actor_id))
                    .order_by(AuditLogColumn::CreatedAt, Direction::Desc)
                    .take(limit),
            )
            .await
    }
}
