// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

// Papéis fechados: o compilador garante que toda checagem de acesso trate todos eles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Owner,
    Cashier,
    Kitchen,
}

impl Role {
    /// Operador da plataforma: enxerga todos os tenants.
    pub fn is_platform_operator(self) -> bool {
        matches!(self, Role::Superadmin)
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: Role,
    pub tenant_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantSummary {
    pub id: i64,
    pub name: String,
    pub business_type: crate::models::tenancy::BusinessType,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantSummary>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,              // Subject (ID do usuário)
    pub username: String,      // Desnormalizado para o livro-razão
    pub tenant_id: Option<i64>, // Ausente para superadmin
    pub role: Role,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
    pub jti: String, // ID único do token
}

/// Quem está fazendo a requisição. Construído apenas a partir de um token válido
/// (ou de um usuário carregado do banco) e passado explicitamente a cada operação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    user_id: i64,
    username: String,
    tenant_id: Option<i64>,
    role: Role,
}

impl Principal {
    /// Falha se o par (papel, tenant) violar a regra: superadmin sem tenant, demais com tenant.
    pub fn new(
        user_id: i64,
        username: impl Into<String>,
        tenant_id: Option<i64>,
        role: Role,
    ) -> Result<Self, AppError> {
        match (role.is_platform_operator(), tenant_id) {
            (true, None) | (false, Some(_)) => Ok(Self {
                user_id,
                username: username.into(),
                tenant_id,
                role,
            }),
            (true, Some(t)) => {
                tracing::error!(user_id, tenant_id = t, "superadmin com tenant vinculado");
                Err(AppError::invalid_token())
            }
            (false, None) => {
                tracing::error!(user_id, ?role, "usuário de loja sem tenant vinculado");
                Err(AppError::invalid_token())
            }
        }
    }

    pub fn from_user(user: &User) -> Result<Self, AppError> {
        Self::new(user.id, user.username.clone(), user.tenant_id, user.role)
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn tenant_id(&self) -> Option<i64> {
        self.tenant_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_platform_operator(&self) -> bool {
        self.role.is_platform_operator()
    }
}

// --- Gestão de equipe ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[validate(length(min = 3, max = 64, message = "O usuário deve ter entre 3 e 64 caracteres."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub role: Role,
}

/// Campos ausentes ficam como estão.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    #[validate(length(min = 3, max = 64, message = "O usuário deve ter entre 3 e 64 caracteres."))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superadmin_never_carries_a_tenant() {
        assert!(Principal::new(1, "root", None, Role::Superadmin).is_ok());
        let err = Principal::new(1, "root", Some(3), Role::Superadmin).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn store_roles_require_a_tenant() {
        for role in [Role::Owner, Role::Cashier, Role::Kitchen] {
            assert!(Principal::new(2, "ana", Some(7), role).is_ok());
            assert!(Principal::new(2, "ana", None, role).is_err());
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Kitchen).unwrap(), "\"kitchen\"");
        let role: Role = serde_json::from_str("\"superadmin\"").unwrap();
        assert!(role.is_platform_operator());
    }
}
