// src/services/tenancy_service.rs

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::{
        auth::{Principal, Role, UserSummary},
        tenancy::{
            normalize_modules, CreateTenantPayload, ImpersonationResponse, PlatformStats, Tenant,
            TenantStatus, TenantWithOwner, UpdateTenantPayload,
        },
    },
    services::{
        audit::{AuditEvent, AuditSink},
        auth::{hash_password, AuthService},
    },
};

/// Diretório de lojas: a superfície do operador da plataforma.
#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    auth_service: AuthService,
    audit: Arc<dyn AuditSink>,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        auth_service: AuthService,
        audit: Arc<dyn AuditSink>,
        pool: PgPool,
    ) -> Self {
        Self { tenant_repo, user_repo, auth_service, audit, pool }
    }

    pub async fn list_tenants(&self, operator: &Principal) -> Result<Vec<Tenant>, AppError> {
        ensure_operator(operator)?;
        self.tenant_repo.list_all().await
    }

    pub async fn get_tenant(&self, id: i64) -> Result<Tenant, AppError> {
        self.tenant_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| tenant_not_found(id))
    }

    /// Cria a loja e o seu primeiro dono atomicamente: ou os dois existem, ou nenhum.
    pub async fn create_tenant_with_owner(
        &self,
        operator: &Principal,
        payload: &CreateTenantPayload,
    ) -> Result<TenantWithOwner, AppError> {
        ensure_operator(operator)?;

        // O hash é caro; fazemos fora da transação para não segurar conexão.
        let password_hash = hash_password(&payload.admin_password).await?;
        let modules = normalize_modules(&payload.modules_enabled);

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Estabelecimento (Tenant)
        let tenant = self
            .tenant_repo
            .create_tenant(
                &mut *tx,
                &payload.name,
                payload.business_type,
                payload.address.as_deref(),
                &payload.subscription_plan,
                &modules,
            )
            .await?;

        // 3. Cria o dono. Usuário duplicado = Conflict, e o drop do `tx` desfaz o tenant.
        let owner = self
            .user_repo
            .create_user(&mut *tx, &payload.admin_username, &password_hash, Role::Owner, Some(tenant.id))
            .await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!(
            operator_id = operator.user_id(),
            tenant_id = tenant.id,
            owner_id = owner.id,
            "loja criada"
        );

        Ok(TenantWithOwner {
            tenant,
            user: UserSummary { id: owner.id, username: owner.username, role: owner.role },
        })
    }

    /// Atualização parcial; a linha inteira é regravada.
    pub async fn update_tenant(
        &self,
        operator: &Principal,
        id: i64,
        changes: UpdateTenantPayload,
    ) -> Result<Tenant, AppError> {
        ensure_operator(operator)?;

        let mut tenant = self.get_tenant(id).await?;
        tenant.apply(changes);

        let updated = self.tenant_repo.update_tenant(&tenant).await?;
        tracing::info!(operator_id = operator.user_id(), tenant_id = id, status = ?updated.status, "loja atualizada");
        Ok(updated)
    }

    /// Suspensão é só mudança de estado: nada é apagado.
    pub async fn suspend_tenant(&self, operator: &Principal, id: i64) -> Result<Tenant, AppError> {
        ensure_operator(operator)?;

        let tenant = self
            .tenant_repo
            .set_status(id, TenantStatus::Suspended)
            .await?
            .ok_or_else(|| tenant_not_found(id))?;

        tracing::info!(operator_id = operator.user_id(), tenant_id = id, "loja suspensa");
        Ok(tenant)
    }

    /// Emite um token em nome do dono da loja. Sempre auditado; sem auditoria, sem token.
    pub async fn impersonate(&self, operator: &Principal, tenant_id: i64) -> Result<ImpersonationResponse, AppError> {
        ensure_operator(operator)?;

        let tenant = self.get_tenant(tenant_id).await?;
        let owner = self
            .user_repo
            .find_owner_of_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Dono da loja não encontrado.".into()))?;

        let issued = self.auth_service.create_token(&owner)?;

        self.audit
            .record(
                AuditEvent::Impersonation {
                    operator_id: operator.user_id(),
                    operator_username: operator.username().to_string(),
                    tenant_id,
                    target_user_id: owner.id,
                    token_jti: issued.jti,
                },
                Utc::now(),
            )
            .await?;

        Ok(ImpersonationResponse {
            token: issued.token,
            tenant,
            user: UserSummary { id: owner.id, username: owner.username, role: owner.role },
        })
    }

    pub async fn platform_stats(&self, operator: &Principal) -> Result<PlatformStats, AppError> {
        ensure_operator(operator)?;
        self.tenant_repo.platform_stats().await
    }

    /// Na subida: cria o primeiro superadmin se ainda não existir nenhum.
    pub async fn ensure_platform_operator(&self, username: &str, password: &str) -> Result<bool, AppError> {
        if self.user_repo.superadmin_exists().await? {
            return Ok(false);
        }

        let password_hash = hash_password(password).await?;
        let user = self
            .user_repo
            .create_user(&self.pool, username, &password_hash, Role::Superadmin, None)
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "superadmin inicial criado");
        Ok(true)
    }
}

fn ensure_operator(principal: &Principal) -> Result<(), AppError> {
    if principal.is_platform_operator() {
        Ok(())
    } else {
        Err(AppError::AccessDenied("Acesso restrito ao operador da plataforma.".into()))
    }
}

fn tenant_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Loja {} não encontrada.", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_platform_operators_pass_the_directory_check() {
        let root = Principal::new(1, "root", None, Role::Superadmin).unwrap();
        let owner = Principal::new(2, "dono", Some(7), Role::Owner).unwrap();

        assert!(ensure_operator(&root).is_ok());
        assert!(matches!(ensure_operator(&owner), Err(AppError::AccessDenied(_))));
    }
}
