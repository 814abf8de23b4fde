// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{OperatorOnly, RequireRole},
    models::{
        auth::Principal,
        tenancy::{
            CreateTenantPayload, ImpersonationResponse, PlatformStats, Tenant, TenantWithOwner,
            UpdateTenantPayload,
        },
    },
};

// GET /api/superadmin/tenants
#[utoipa::path(
    get,
    path = "/api/superadmin/tenants",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Todas as lojas", body = Vec<Tenant>),
        (status = 403, description = "Apenas operador da plataforma")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tenants(
    State(app_state): State<AppState>,
    _guard: RequireRole<OperatorOnly>,
    principal: Principal,
) -> Result<Json<Vec<Tenant>>, AppError> {
    Ok(Json(app_state.tenant_service.list_tenants(&principal).await?))
}

// POST /api/superadmin/tenants
#[utoipa::path(
    post,
    path = "/api/superadmin/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Loja e dono criados", body = TenantWithOwner),
        (status = 400, description = "Payload inválido"),
        (status = 409, description = "Usuário já existe; nada foi criado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    _guard: RequireRole<OperatorOnly>,
    principal: Principal,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validar o payload
    payload.validate()?;

    // 2. Chamar o Serviço (loja + dono na mesma transação)
    let created = app_state
        .tenant_service
        .create_tenant_with_owner(&principal, &payload)
        .await?;

    // 3. Responder com Sucesso
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/superadmin/tenants/{id}
#[utoipa::path(
    put,
    path = "/api/superadmin/tenants/{id}",
    tag = "Tenancy",
    params(("id" = i64, Path, description = "ID da loja")),
    request_body = UpdateTenantPayload,
    responses(
        (status = 200, description = "Loja atualizada", body = Tenant),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tenant(
    State(app_state): State<AppState>,
    _guard: RequireRole<OperatorOnly>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTenantPayload>,
) -> Result<Json<Tenant>, AppError> {
    payload.validate()?;
    let tenant = app_state
        .tenant_service
        .update_tenant(&principal, id, payload)
        .await?;
    Ok(Json(tenant))
}

// DELETE /api/superadmin/tenants/{id}  (suspende, não apaga)
#[utoipa::path(
    delete,
    path = "/api/superadmin/tenants/{id}",
    tag = "Tenancy",
    params(("id" = i64, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Loja suspensa", body = Tenant),
        (status = 404, description = "Loja não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn suspend_tenant(
    State(app_state): State<AppState>,
    _guard: RequireRole<OperatorOnly>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<Json<Tenant>, AppError> {
    Ok(Json(app_state.tenant_service.suspend_tenant(&principal, id).await?))
}

// POST /api/superadmin/tenants/{id}/impersonate
#[utoipa::path(
    post,
    path = "/api/superadmin/tenants/{id}/impersonate",
    tag = "Tenancy",
    params(("id" = i64, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Token emitido em nome do dono (auditado)", body = ImpersonationResponse),
        (status = 404, description = "Loja ou dono não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn impersonate(
    State(app_state): State<AppState>,
    _guard: RequireRole<OperatorOnly>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<Json<ImpersonationResponse>, AppError> {
    Ok(Json(app_state.tenant_service.impersonate(&principal, id).await?))
}

// GET /api/superadmin/stats
#[utoipa::path(
    get,
    path = "/api/superadmin/stats",
    tag = "Tenancy",
    responses((status = 200, description = "Indicadores da plataforma", body = PlatformStats)),
    security(("api_jwt" = []))
)]
pub async fn platform_stats(
    State(app_state): State<AppState>,
    _guard: RequireRole<OperatorOnly>,
    principal: Principal,
) -> Result<Json<PlatformStats>, AppError> {
    Ok(Json(app_state.tenant_service.platform_stats(&principal).await?))
}
