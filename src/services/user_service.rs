// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    middleware::tenancy::TenantScope,
    models::auth::{CreateUserPayload, Principal, Role, UpdateUserPayload, User},
    services::auth::hash_password,
};

/// Gestão de equipe da loja (donos) e de qualquer loja (operador).
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn list_users(&self, principal: &Principal, scope: &TenantScope) -> Result<Vec<User>, AppError> {
        ensure_can_manage_staff(principal)?;
        self.user_repo.list(scope).await
    }

    pub async fn get_user(&self, principal: &Principal, scope: &TenantScope, id: i64) -> Result<User, AppError> {
        ensure_can_manage_staff(principal)?;
        self.user_repo
            .find_by_id(scope, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Usuário {} não encontrado.", id)))
    }

    pub async fn create_user(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        payload: &CreateUserPayload,
    ) -> Result<User, AppError> {
        ensure_can_manage_staff(principal)?;
        ensure_can_grant(principal, payload.role)?;

        // Superadmin não pertence a loja; os demais papéis nascem na loja do escopo.
        let tenant_id = if payload.role.is_platform_operator() {
            None
        } else {
            Some(scope.target_tenant()?)
        };

        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create_user(&self.pool, &payload.username, &password_hash, payload.role, tenant_id)
            .await?;

        tracing::info!(
            actor_id = principal.user_id(),
            user_id = user.id,
            tenant_id = ?user.tenant_id,
            role = ?user.role,
            "usuário criado"
        );
        Ok(user)
    }

    pub async fn update_user(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        id: i64,
        payload: UpdateUserPayload,
    ) -> Result<User, AppError> {
        let mut user = self.get_user(principal, scope, id).await?;

        if let Some(role) = payload.role {
            ensure_can_grant(principal, role)?;
            // O vínculo com a loja não muda, então o papel não pode cruzar a fronteira plataforma/loja.
            if role.is_platform_operator() != user.role.is_platform_operator() {
                return Err(AppError::InvalidOperation(
                    "Não é possível converter usuário de loja em superadmin (ou vice-versa).".into(),
                ));
            }
            user.role = role;
        }
        if let Some(username) = payload.username {
            user.username = username;
        }
        if let Some(password) = payload.password {
            user.password_hash = hash_password(&password).await?;
        }

        let updated = self.user_repo.update_user(&user).await?;
        tracing::info!(actor_id = principal.user_id(), user_id = id, "usuário atualizado");
        Ok(updated)
    }

    pub async fn delete_user(&self, principal: &Principal, scope: &TenantScope, id: i64) -> Result<(), AppError> {
        let user = self.get_user(principal, scope, id).await?;

        if user.role.is_platform_operator() {
            return Err(AppError::InvalidOperation("Um superadmin não pode ser removido.".into()));
        }
        if user.id == principal.user_id() {
            return Err(AppError::InvalidOperation("Você não pode remover a si mesmo.".into()));
        }

        self.user_repo.delete_user(id).await?;
        tracing::info!(actor_id = principal.user_id(), user_id = id, "usuário removido");
        Ok(())
    }
}

fn ensure_can_manage_staff(principal: &Principal) -> Result<(), AppError> {
    match principal.role() {
        Role::Superadmin | Role::Owner => Ok(()),
        Role::Cashier | Role::Kitchen => Err(AppError::AccessDenied(
            "Apenas o dono da loja gerencia a equipe.".into(),
        )),
    }
}

fn ensure_can_grant(principal: &Principal, role: Role) -> Result<(), AppError> {
    if role.is_platform_operator() && !principal.is_platform_operator() {
        return Err(AppError::AccessDenied("Apenas o operador da plataforma cria superadmins.".into()));
    }
    Ok(())
}
