// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantScope,
    models::crm::{Customer, CustomerFields, Supplier, SupplierFields},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub search: Option<String>,
}

// =========================================================================
//  CLIENTES
// =========================================================================

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "CRM",
    params(SearchQuery),
    responses((status = 200, description = "Clientes da loja", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = app_state
        .crm_service
        .list_customers(&scope, query.search.as_deref())
        .await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(app_state.crm_service.get_customer(&scope, id).await?))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "CRM",
    request_body = CustomerFields,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Payload inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Json(payload): Json<CustomerFields>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let customer = app_state.crm_service.create_customer(&scope, &payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerFields>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.crm_service.update_customer(&scope, id, &payload).await?))
}

pub async fn delete_customer(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.crm_service.delete_customer(&scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
//  FORNECEDORES
// =========================================================================

pub async fn list_suppliers(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = app_state
        .crm_service
        .list_suppliers(&scope, query.search.as_deref())
        .await?;
    Ok(Json(suppliers))
}

pub async fn get_supplier(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<Json<Supplier>, AppError> {
    Ok(Json(app_state.crm_service.get_supplier(&scope, id).await?))
}

pub async fn create_supplier(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Json(payload): Json<SupplierFields>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let supplier = app_state.crm_service.create_supplier(&scope, &payload).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
    Json(payload): Json<SupplierFields>,
) -> Result<Json<Supplier>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.crm_service.update_supplier(&scope, id, &payload).await?))
}

pub async fn delete_supplier(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.crm_service.delete_supplier(&scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
