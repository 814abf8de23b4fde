// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Principal, Role},
};

/// 1. O Trait que define um requisito de papel
pub trait RoleRequirement: Send + Sync + 'static {
    const DESCRIPTION: &'static str;
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o principal (colocado pelo auth_guard)
        let principal = parts
            .extensions
            .get::<Principal>()
            .ok_or_else(AppError::invalid_token)?;

        // B. Papel fechado: a checagem é exaustiva
        if !T::allows(principal.role()) {
            tracing::warn!(
                user_id = principal.user_id(),
                role = ?principal.role(),
                required = T::DESCRIPTION,
                "acesso negado por papel"
            );
            return Err(AppError::AccessDenied(format!(
                "Você precisa ser {} para realizar esta ação.",
                T::DESCRIPTION
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS REQUISITOS (TIPOS)
// ---

pub struct OperatorOnly;
impl RoleRequirement for OperatorOnly {
    const DESCRIPTION: &'static str = "operador da plataforma";
    fn allows(role: Role) -> bool {
        role.is_platform_operator()
    }
}

pub struct ManageStaff;
impl RoleRequirement for ManageStaff {
    const DESCRIPTION: &'static str = "dono da loja";
    fn allows(role: Role) -> bool {
        matches!(role, Role::Superadmin | Role::Owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn check<T: RoleRequirement>(principal: Option<Principal>) -> Result<RequireRole<T>, AppError> {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        if let Some(p) = principal {
            parts.extensions.insert(p);
        }
        RequireRole::<T>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn operator_only_rejects_store_roles() {
        let root = Principal::new(1, "root", None, Role::Superadmin).unwrap();
        let owner = Principal::new(2, "dono", Some(3), Role::Owner).unwrap();

        assert!(check::<OperatorOnly>(Some(root)).await.is_ok());
        assert!(matches!(
            check::<OperatorOnly>(Some(owner)).await,
            Err(AppError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn staff_management_allows_owners_but_not_cashiers() {
        let owner = Principal::new(2, "dono", Some(3), Role::Owner).unwrap();
        let cashier = Principal::new(4, "caixa", Some(3), Role::Cashier).unwrap();

        assert!(check::<ManageStaff>(Some(owner)).await.is_ok());
        assert!(check::<ManageStaff>(Some(cashier)).await.is_err());
    }

    #[tokio::test]
    async fn missing_principal_is_unauthenticated() {
        assert!(matches!(
            check::<ManageStaff>(None).await,
            Err(AppError::Unauthenticated(_))
        ));
    }
}
