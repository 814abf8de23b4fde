// src/handlers/auth.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        auth::{AuthResponse, LoginUserPayload, Principal},
        tenancy::ClientConfig,
    },
};

// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 400, description = "Payload inválido"),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login_user(&payload.username, &payload.password)
        .await?;

    Ok(Json(response))
}

// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Quem está logado", body = Principal),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(principal: Principal) -> Json<Principal> {
    Json(principal)
}

// GET /api/config
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Auth",
    responses(
        (status = 200, description = "Configuração do PDV para o usuário", body = ClientConfig),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_config(
    State(app_state): State<AppState>,
    principal: Principal,
) -> Result<Json<ClientConfig>, AppError> {
    let config = app_state.auth_service.client_config(&principal).await?;
    Ok(Json(config))
}
