// src/services/audit.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::common::error::AppError;

/// Operações privilegiadas que precisam deixar rastro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditEvent {
    Impersonation {
        operator_id: i64,
        operator_username: String,
        tenant_id: i64,
        target_user_id: i64,
        token_jti: Uuid,
    },
}

/// Destino dos registros de auditoria. O padrão escreve no `tracing` (alvo `audit`).
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent, at: DateTime<Utc>) -> Result<(), AppError> {
        match &event {
            AuditEvent::Impersonation { operator_id, operator_username, tenant_id, target_user_id, token_jti } => {
                tracing::warn!(
                    target: "audit",
                    action = "impersonation",
                    operator_id,
                    operator_username = %operator_username,
                    tenant_id,
                    target_user_id,
                    token_jti = %token_jti,
                    at = %at.to_rfc3339(),
                    "operador assumiu a sessão do dono da loja"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_sink_accepts_impersonation_events() {
        let sink = TracingAuditSink;
        let event = AuditEvent::Impersonation {
            operator_id: 1,
            operator_username: "root".into(),
            tenant_id: 7,
            target_user_id: 42,
            token_jti: Uuid::new_v4(),
        };
        assert!(sink.record(event, Utc::now()).await.is_ok());
    }

    #[test]
    fn events_serialize_with_their_action_tag() {
        let event = AuditEvent::Impersonation {
            operator_id: 1,
            operator_username: "root".into(),
            tenant_id: 7,
            target_user_id: 42,
            token_jti: Uuid::nil(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "impersonation");
        assert_eq!(json["tenant_id"], 7);
    }
}
