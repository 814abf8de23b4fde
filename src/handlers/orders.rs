// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::AppError,
    config::AppState,
    db::orders_repo::OrderFilter,
    middleware::tenancy::TenantScope,
    models::{
        auth::Principal,
        inventory::StockAdjustment,
        orders::{CheckoutRequest, DailySales, Order, OrderCreated, OrderStatus, StockDecrement},
    },
    services::order_service::DEFAULT_ORDER_LIMIT,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    /// RFC 3339
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Padrão 50
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailySalesQuery {
    /// AAAA-MM-DD; padrão hoje (UTC)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusPayload {
    pub status: OrderStatus,
}

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Venda registrada e estoque baixado", body = OrderCreated),
        (status = 422, description = "Operador sem loja selecionada"),
        (status = 500, description = "Falha na transação; nada foi gravado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    principal: Principal,
    scope: TenantScope,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state.order_service.settle(&principal, &scope, &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Pedidos, do mais novo ao mais antigo", body = Vec<Order>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let filter = OrderFilter {
        status: query.status,
        date_from: query.date_from,
        date_to: query.date_to,
        limit: query.limit.unwrap_or(DEFAULT_ORDER_LIMIT),
    };

    let orders = app_state.order_service.list_orders(&scope, filter).await?;
    Ok(Json(orders))
}

// GET /api/orders/daily-sales
#[utoipa::path(
    get,
    path = "/api/orders/daily-sales",
    tag = "Orders",
    params(DailySalesQuery),
    responses(
        (status = 200, description = "Total, quantidade e ticket médio do dia", body = DailySales)
    ),
    security(("api_jwt" = []))
)]
pub async fn daily_sales(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<DailySalesQuery>,
) -> Result<Json<DailySales>, AppError> {
    let sales = app_state.order_service.daily_sales(&scope, query.date).await?;
    Ok(Json(sales))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = Order),
        (status = 403, description = "Pedido de outra loja"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<Json<Order>, AppError> {
    let order = app_state.order_service.get_order(&scope, id).await?;
    Ok(Json(order))
}

// PATCH /api/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = i64, Path, description = "ID do pedido")),
    request_body = UpdateOrderStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Order),
        (status = 404, description = "Pedido não encontrado"),
        (status = 422, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<Json<Order>, AppError> {
    let order = app_state
        .order_service
        .update_status(&scope, id, payload.status)
        .await?;
    Ok(Json(order))
}

// POST /api/products/bulk-stock
#[utoipa::path(
    post,
    path = "/api/products/bulk-stock",
    tag = "Orders",
    request_body = Vec<StockDecrement>,
    responses(
        (status = 200, description = "Baixas aplicadas", body = Vec<StockAdjustment>),
        (status = 404, description = "Algum produto não existe; nada foi baixado")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_decrement_stock(
    State(app_state): State<AppState>,
    principal: Principal,
    scope: TenantScope,
    Json(items): Json<Vec<StockDecrement>>,
) -> Result<Json<Vec<StockAdjustment>>, AppError> {
    let adjustments = app_state
        .order_service
        .bulk_decrement(&principal, &scope, &items)
        .await?;
    Ok(Json(adjustments))
}
