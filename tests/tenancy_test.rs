// tests/tenancy_test.rs
mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::TestApp;
use pos_backend::{
    common::error::{AppError, ErrorKind},
    middleware::tenancy::TenantScope,
    models::{
        auth::{CreateUserPayload, Role},
        tenancy::{BusinessType, CreateTenantPayload, TenantStatus, UpdateTenantPayload},
    },
    services::{
        audit::{AuditEvent, AuditSink},
        auth::resolve_principal,
    },
};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn record(&self, event: AuditEvent, _at: DateTime<Utc>) -> Result<(), AppError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

struct BrokenSink;

#[async_trait]
impl AuditSink for BrokenSink {
    async fn record(&self, _event: AuditEvent, _at: DateTime<Utc>) -> Result<(), AppError> {
        Err(AppError::InternalServerError(anyhow::anyhow!("auditoria indisponível")))
    }
}

async fn tenants_named(app: &TestApp, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tenants WHERE name = $1")
        .bind(name)
        .fetch_one(&app.state.db_pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn duplicate_owner_username_leaves_no_tenant_behind() {
    let Some(app) = TestApp::try_new().await else { return };
    let (_, _, taken_username) = app.tenant_with_owner().await;

    let name = format!("Loja duplicada {}", uuid::Uuid::new_v4());
    let payload = CreateTenantPayload {
        name: name.clone(),
        business_type: BusinessType::FoodBeverage,
        address: None,
        admin_username: taken_username,
        admin_password: "senha123".into(),
        modules_enabled: vec![],
        subscription_plan: "basic".into(),
    };

    let err = app
        .state
        .tenant_service
        .create_tenant_with_owner(&app.operator(), &payload)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(tenants_named(&app, &name).await, 0);
}

#[tokio::test]
async fn only_operators_manage_tenants() {
    let Some(app) = TestApp::try_new().await else { return };
    let (tenant_id, owner, _) = app.tenant_with_owner().await;

    let err = app.state.tenant_service.list_tenants(&owner).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);

    let err = app.state.tenant_service.suspend_tenant(&owner, tenant_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
}

#[tokio::test]
async fn update_and_suspend_keep_the_tenant_row() {
    let Some(app) = TestApp::try_new().await else { return };
    let (tenant_id, _, _) = app.tenant_with_owner().await;
    let operator = app.operator();

    let updated = app
        .state
        .tenant_service
        .update_tenant(
            &operator,
            tenant_id,
            UpdateTenantPayload {
                modules_enabled: Some(vec![" Kitchen ".into(), "kitchen".into(), "tables".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.modules_enabled, vec!["kitchen".to_string(), "tables".to_string()]);

    let suspended = app.state.tenant_service.suspend_tenant(&operator, tenant_id).await.unwrap();
    assert_eq!(suspended.status, TenantStatus::Suspended);
    assert!(app.state.tenant_service.get_tenant(tenant_id).await.is_ok());

    let err = app.state.tenant_service.suspend_tenant(&operator, i64::MAX).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn impersonation_is_audited_and_yields_owner_token() {
    let sink = Arc::new(RecordingSink::default());
    let Some(app) = TestApp::try_with_audit(sink.clone()).await else { return };
    let (tenant_id, owner, _) = app.tenant_with_owner().await;

    let response = app
        .state
        .tenant_service
        .impersonate(&app.operator(), tenant_id)
        .await
        .unwrap();

    let principal = resolve_principal(&response.token, common::JWT_SECRET).unwrap();
    assert_eq!(principal.user_id(), owner.user_id());
    assert_eq!(principal.tenant_id(), Some(tenant_id));

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
        AuditEvent::Impersonation { tenant_id: audited, target_user_id, .. } => {
            assert_eq!(*audited, tenant_id);
            assert_eq!(*target_user_id, owner.user_id());
        }
    }
}

#[tokio::test]
async fn impersonation_fails_when_audit_cannot_be_written() {
    let Some(app) = TestApp::try_with_audit(Arc::new(BrokenSink)).await else { return };
    let (tenant_id, _, _) = app.tenant_with_owner().await;

    let err = app
        .state
        .tenant_service
        .impersonate(&app.operator(), tenant_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
}

#[tokio::test]
async fn owners_hire_staff_only_inside_their_store() {
    let Some(app) = TestApp::try_new().await else { return };
    let (tenant_id, owner, _) = app.tenant_with_owner().await;
    let scope = TenantScope::for_principal(&owner);
    let username = format!("caixa_{}", &uuid::Uuid::new_v4().simple().to_string()[..10]);

    let cashier = app
        .state
        .user_service
        .create_user(
            &owner,
            &scope,
            &CreateUserPayload { username, password: "senha123".into(), role: Role::Cashier },
        )
        .await
        .unwrap();
    assert_eq!(cashier.tenant_id, Some(tenant_id));

    let err = app
        .state
        .user_service
        .create_user(
            &owner,
            &scope,
            &CreateUserPayload { username: "quer_ser_root".into(), password: "senha123".into(), role: Role::Superadmin },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);

    let err = app.state.user_service.delete_user(&owner, &scope, owner.user_id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}
