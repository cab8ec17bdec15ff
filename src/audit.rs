use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::{NotSet, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{db::OrmConn, entity::audit_logs, error::AppResult};

/// Explicit attribution for write operations. Handlers construct one from the
/// request identity and pass it down; there is no ambient "current user".
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    actor: Option<Uuid>,
}

impl AuditContext {
    pub fn customer(user_id: Uuid) -> Self {
        Self {
            actor: Some(user_id),
        }
    }

    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    pub fn actor(&self) -> Option<Uuid> {
        self.actor
    }
}

pub async fn log_audit(
    conn: &OrmConn,
    ctx: &AuditContext,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    audit_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(ctx.actor()),
        action: Set(action.to_string()),
        resource: Set(resource.map(str::to_string)),
        metadata: Set(metadata),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(())
}
