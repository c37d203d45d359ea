//! `AuditLog` table. Append-only by convention; nothing references it.

use chrono::Utc;

use vitrine_core::{AuditLog, NewAuditLog};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model};
use crate::query::{columns, Value};
use crate::schema::id_key;

columns! {
    pub enum AuditLogColumn for "AuditLog" {
        Id => "id": Text,
        ActorId => "actorId": Text,
        Role => "role": Text,
        Action => "action": Text,
        Resource => "resource": Text,
        ResourceId => "resourceId": Text,
        Metadata => "metadata": Json,
        Ip => "ip": Text,
        CreatedAt => "createdAt": Timestamp,
    }
}

id_key!(AuditLogKey => AuditLogColumn);

impl Model for AuditLog {
    type Column = AuditLogColumn;
    type Key = AuditLogKey;
    type Create = NewAuditLog;

    const ENTITY: &'static str = "AuditLog";
    const UPDATED_AT: Option<AuditLogColumn> = None;
}

impl Insertable for NewAuditLog {
    type Column = AuditLogColumn;

    fn into_row(self) -> DbResult<Vec<(AuditLogColumn, Value)>> {
        self.validate()?;
        let metadata = self
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        Ok(vec![
            (AuditLogColumn::Id, generate_id(self.id).into()),
            (AuditLogColumn::ActorId, self.actor_id.into()),
            (AuditLogColumn::Role, self.role.into()),
            (AuditLogColumn::Action, self.action.into()),
            (AuditLogColumn::Resource, self.resource.into()),
            (AuditLogColumn::ResourceId, self.resource_id.into()),
            (AuditLogColumn::Metadata, metadata.into()),
            (AuditLogColumn::Ip, self.ip.into()),
            (
                AuditLogColumn::CreatedAt,
                self.created_at.unwrap_or_else(Utc::now).into(),
            ),
        ])
    }
}
