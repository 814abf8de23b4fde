// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::{common::error::AppError, models::auth::Principal};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    AllTenants,
    Tenant(i64),
}

/// O filtro de tenant efetivo de uma requisição.
///
/// Só é construído a partir de um `Principal`, e todo repositório com dados de loja
/// recebe um `&TenantScope`: não existe caminho até o banco que pule esta checagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope(Filter);

impl TenantScope {
    /// Operador: usa o filtro pedido (ou nenhum). Demais papéis: sempre o próprio tenant,
    /// ignorando o que veio na query/corpo.
    pub fn resolve(principal: &Principal, requested: Option<i64>) -> Self {
        if principal.is_platform_operator() {
            return match requested {
                Some(tenant_id) => TenantScope(Filter::Tenant(tenant_id)),
                None => TenantScope(Filter::AllTenants),
            };
        }

        match principal.tenant_id() {
            Some(own) => {
                if let Some(other) = requested.filter(|r| *r != own) {
                    tracing::warn!(
                        user_id = principal.user_id(),
                        own_tenant = own,
                        requested_tenant = other,
                        "filtro de tenant ignorado para usuário de loja"
                    );
                }
                TenantScope(Filter::Tenant(own))
            }
            // `Principal::new` impede este caso; se aparecer, o escopo não enxerga nada.
            None => TenantScope(Filter::Tenant(-1)),
        }
    }

    pub fn for_principal(principal: &Principal) -> Self {
        Self::resolve(principal, None)
    }

    /// `None` = sem filtro (todas as lojas).
    pub fn tenant_id(&self) -> Option<i64> {
        match self.0 {
            Filter::AllTenants => None,
            Filter::Tenant(id) => Some(id),
        }
    }

    pub fn permits(&self, owner_tenant_id: i64) -> bool {
        match self.0 {
            Filter::AllTenants => true,
            Filter::Tenant(id) => id == owner_tenant_id,
        }
    }

    /// Falha com `AccessDenied` se a entidade pertence a outro tenant.
    pub fn ensure(&self, owner_tenant_id: i64) -> Result<(), AppError> {
        if self.permits(owner_tenant_id) {
            Ok(())
        } else {
            Err(AppError::AccessDenied(
                "O recurso pertence a outra loja.".into(),
            ))
        }
    }

    /// Tenant onde uma entidade nova será criada. Um operador sem filtro precisa escolher um.
    pub fn target_tenant(&self) -> Result<i64, AppError> {
        self.tenant_id().ok_or_else(|| {
            AppError::InvalidOperation(
                "Informe a loja (x-tenant-id ou tenant_id) para criar este recurso.".into(),
            )
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct TenantFilterQuery {
    tenant_id: Option<i64>,
}

fn requested_tenant(parts: &Parts) -> Result<Option<i64>, AppError> {
    // 1. Cabeçalho X-Tenant-ID tem prioridade
    if let Some(value) = parts.headers.get(TENANT_ID_HEADER) {
        let tenant_id = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                AppError::InvalidOperation("Cabeçalho X-Tenant-ID inválido.".into())
            })?;
        return Ok(Some(tenant_id));
    }

    // 2. Depois, o parâmetro ?tenant_id=
    let query = Query::<TenantFilterQuery>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    Ok(query.tenant_id)
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(AppError::invalid_token)?;

        // Filtro pedido só importa para operadores; para os demais é descartado.
        let requested = if principal.is_platform_operator() {
            requested_tenant(parts)?
        } else {
            None
        };

        Ok(TenantScope::resolve(&principal, requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use axum::http::Request;

    fn operator() -> Principal {
        Principal::new(1, "root", None, Role::Superadmin).unwrap()
    }

    fn cashier_of(tenant: i64) -> Principal {
        Principal::new(10, "caixa", Some(tenant), Role::Cashier).unwrap()
    }

    #[test]
    fn operator_without_filter_sees_everything() {
        let scope = TenantScope::resolve(&operator(), None);
        assert_eq!(scope.tenant_id(), None);
        assert!(scope.permits(1));
        assert!(scope.permits(999));
    }

    #[test]
    fn operator_filter_is_honoured() {
        let scope = TenantScope::resolve(&operator(), Some(4));
        assert_eq!(scope.tenant_id(), Some(4));
        assert!(scope.ensure(4).is_ok());
        assert!(matches!(scope.ensure(5), Err(AppError::AccessDenied(_))));
    }

    #[test]
    fn store_user_filter_is_overridden_by_own_tenant() {
        let scope = TenantScope::resolve(&cashier_of(7), Some(8));
        assert_eq!(scope.tenant_id(), Some(7));
        assert!(matches!(scope.ensure(8), Err(AppError::AccessDenied(_))));
        assert!(scope.ensure(7).is_ok());
    }

    #[test]
    fn unscoped_operator_must_pick_a_tenant_to_create() {
        assert!(matches!(
            TenantScope::for_principal(&operator()).target_tenant(),
            Err(AppError::InvalidOperation(_))
        ));
        assert_eq!(TenantScope::for_principal(&cashier_of(3)).target_tenant().unwrap(), 3);
    }

    async fn extract(principal: Principal, req: Request<()>) -> Result<TenantScope, AppError> {
        let (mut parts, _) = req.into_parts();
        parts.extensions.insert(principal);
        TenantScope::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extractor_reads_header_then_query_for_operators() {
        let by_header = Request::builder()
            .uri("/api/products?tenant_id=2")
            .header("x-tenant-id", "5")
            .body(())
            .unwrap();
        assert_eq!(extract(operator(), by_header).await.unwrap().tenant_id(), Some(5));

        let by_query = Request::builder()
            .uri("/api/products?search=cafe&tenant_id=2")
            .body(())
            .unwrap();
        assert_eq!(extract(operator(), by_query).await.unwrap().tenant_id(), Some(2));
    }

    #[tokio::test]
    async fn extractor_ignores_filters_from_store_users() {
        let req = Request::builder()
            .uri("/api/orders?tenant_id=99")
            .header("x-tenant-id", "99")
            .body(())
            .unwrap();
        assert_eq!(extract(cashier_of(3), req).await.unwrap().tenant_id(), Some(3));
    }

    #[tokio::test]
    async fn extractor_requires_an_authenticated_principal() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let err = TenantScope::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
