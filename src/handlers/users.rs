// src/handlers/users.rs

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
    middleware::{
        rbac::{ManageStaff, RequireRole},
        tenancy::TenantScope,
    },
    models::auth::{CreateUserPayload, Principal, UpdateUserPayload, User},
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Equipe da loja", body = Vec<User>),
        (status = 403, description = "Apenas donos gerenciam a equipe")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequireRole<ManageStaff>,
    principal: Principal,
    scope: TenantScope,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.user_service.list_users(&principal, &scope).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<ManageStaff>,
    principal: Principal,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let user = app_state.user_service.get_user(&principal, &scope, id).await?;
    Ok(Json(user))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 403, description = "Papel não permitido"),
        (status = 409, description = "Usuário já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<ManageStaff>,
    principal: Principal,
    scope: TenantScope,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = app_state.user_service.create_user(&principal, &scope, &payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<ManageStaff>,
    principal: Principal,
    scope: TenantScope,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;
    let user = app_state
        .user_service
        .update_user(&principal, &scope, id, payload)
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    _guard: RequireRole<ManageStaff>,
    principal: Principal,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.user_service.delete_user(&principal, &scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
