// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantScope,
    models::{
        auth::Principal,
        inventory::{Product, ProductFields, StockAdjustment, StockCategory, StockLedgerEntry},
    },
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_zero(val: i32) -> Result<(), ValidationError> {
    if val == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("A quantidade não pode ser zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Produtos
// ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// "All Items" equivale a não filtrar
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "12.50")]
    pub price: Decimal,

    pub category: Option<String>,
    pub image_url: Option<String>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,

    /// Estoque inicial; entra no livro-razão como reposição.
    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque inicial não pode ser negativo."))]
    pub stock: i32,
}

/// Atualização parcial. O estoque não é editável aqui.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "12.50")]
    pub price: Option<Decimal>,

    pub category: Option<String>,
    pub image_url: Option<String>,

    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
}

impl UpdateProductPayload {
    fn merge_into(self, current: &Product) -> ProductFields {
        ProductFields {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            price: self.price.unwrap_or(current.price),
            category: self.category.or_else(|| current.category.clone()),
            image_url: self.image_url.or_else(|| current.image_url.clone()),
            metadata: self.metadata.unwrap_or_else(|| current.metadata.clone()),
        }
    }
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(
        ProductListQuery,
        ("x-tenant-id" = Option<i64>, Header, description = "Filtro de loja (apenas operador)")
    ),
    responses(
        (status = 200, description = "Produtos da loja", body = Vec<Product>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state
        .inventory_service
        .list_products(&scope, query.category.as_deref(), query.search.as_deref())
        .await?;
    Ok(Json(products))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    let product = app_state.inventory_service.get_product(&scope, id).await?;
    Ok(Json(product))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Payload inválido"),
        (status = 422, description = "Operador sem loja selecionada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    principal: Principal,
    scope: TenantScope,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let fields = ProductFields {
        name: payload.name,
        price: payload.price,
        category: payload.category,
        image_url: payload.image_url,
        metadata: payload
            .metadata
            .unwrap_or_else(|| Value::Object(Default::default())),
    };

    let product = app_state
        .inventory_service
        .create_product(&principal, &scope, &fields, payload.stock)
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;

    let current = app_state.inventory_service.get_product(&scope, id).await?;
    let fields = payload.merge_into(&current);

    let product = app_state
        .inventory_service
        .update_product(&scope, id, &fields)
        .await?;
    Ok(Json(product))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto removido"),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.inventory_service.delete_product(&scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Estoque (livro-razão)
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockPayload {
    pub product_id: i64,

    /// Positivo = entrada, negativo = saída
    #[validate(custom(function = "validate_not_zero"))]
    pub change_amount: i32,

    /// Ex.: Avaria, Validade, Correção, Inventário
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RestockPayload {
    pub product_id: i64,

    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,

    pub supplier_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockHistoryQuery {
    pub product_id: Option<i64>,
    /// sale | restock | adjustment | return
    #[serde(rename = "type")]
    pub category: Option<StockCategory>,
    /// Padrão 50
    pub limit: Option<i64>,
}

// POST /api/stock/adjust
#[utoipa::path(
    post,
    path = "/api/stock/adjust",
    tag = "Stock",
    request_body = AdjustStockPayload,
    responses(
        (status = 200, description = "Novo saldo e lançamento gravado", body = StockAdjustment),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado"),
        (status = 422, description = "O estoque ficaria negativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    principal: Principal,
    scope: TenantScope,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<Json<StockAdjustment>, AppError> {
    payload.validate()?;

    let adjustment = app_state
        .inventory_service
        .adjust_stock(&principal, &scope, payload.product_id, payload.change_amount, &payload.reason)
        .await?;
    Ok(Json(adjustment))
}

// POST /api/stock/restock
#[utoipa::path(
    post,
    path = "/api/stock/restock",
    tag = "Stock",
    request_body = RestockPayload,
    responses(
        (status = 200, description = "Entrada registrada", body = StockAdjustment),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn restock(
    State(app_state): State<AppState>,
    principal: Principal,
    scope: TenantScope,
    Json(payload): Json<RestockPayload>,
) -> Result<Json<StockAdjustment>, AppError> {
    payload.validate()?;

    let adjustment = app_state
        .inventory_service
        .restock(
            &principal,
            &scope,
            payload.product_id,
            payload.quantity,
            payload.supplier_id,
            payload.notes.as_deref(),
        )
        .await?;
    Ok(Json(adjustment))
}

// GET /api/stock/logs
#[utoipa::path(
    get,
    path = "/api/stock/logs",
    tag = "Stock",
    params(StockHistoryQuery),
    responses(
        (status = 200, description = "Lançamentos, do mais novo ao mais antigo", body = Vec<StockLedgerEntry>),
        (status = 422, description = "Limite negativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn stock_history(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<StockHistoryQuery>,
) -> Result<Json<Vec<StockLedgerEntry>>, AppError> {
    let entries = app_state
        .inventory_service
        .history(&scope, query.product_id, query.category, query.limit)
        .await?;
    Ok(Json(entries))
}

// GET /api/stock/logs/{product_id}
#[utoipa::path(
    get,
    path = "/api/stock/logs/{product_id}",
    tag = "Stock",
    params(("product_id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Histórico do produto", body = Vec<StockLedgerEntry>),
        (status = 403, description = "Produto de outra loja"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn product_stock_history(
    State(app_state): State<AppState>,
    scope: TenantScope,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<StockLedgerEntry>>, AppError> {
    // Garante existência e escopo antes de listar
    app_state.inventory_service.get_product(&scope, product_id).await?;

    let entries = app_state
        .inventory_service
        .history(&scope, Some(product_id), None, None)
        .await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn adjustment_payload_rejects_zero_and_empty_reason() {
        let payload = AdjustStockPayload { product_id: 1, change_amount: 0, reason: String::new() };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("change_amount"));
        assert!(errors.field_errors().contains_key("reason"));
    }

    #[test]
    fn create_payload_rejects_negative_price_and_stock() {
        let payload: CreateProductPayload = serde_json::from_value(serde_json::json!({
            "name": "Café",
            "price": -1.0,
            "stock": -3
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(errors.field_errors().contains_key("stock"));
    }

    #[test]
    fn partial_update_keeps_absent_fields() {
        let current = Product {
            id: 1,
            tenant_id: 2,
            name: "Café".into(),
            price: Decimal::new(500, 2),
            stock: 10,
            category: Some("Bebidas".into()),
            image_url: None,
            metadata: serde_json::json!({ "sku": "CF-1" }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let payload: UpdateProductPayload =
            serde_json::from_value(serde_json::json!({ "price": 6.5 })).unwrap();

        let fields = payload.merge_into(&current);
        assert_eq!(fields.name, "Café");
        assert_eq!(fields.price, Decimal::new(65, 1));
        assert_eq!(fields.category.as_deref(), Some("Bebidas"));
        assert_eq!(fields.metadata["sku"], "CF-1");
    }

    #[test]
    fn history_query_reads_the_type_parameter() {
        let query: StockHistoryQuery =
            serde_json::from_value(serde_json::json!({ "type": "restock", "limit": 10 })).unwrap();
        assert_eq!(query.category, Some(StockCategory::Restock));
        assert_eq!(query.limit, Some(10));
    }
}
