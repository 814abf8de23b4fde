// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Produtos ---
// O estoque (`stock`) só é alterado pelo livro-razão (InventoryService).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    #[schema(example = "12.50")]
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Categorias de movimentação ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_entry_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StockCategory {
    Sale,
    Restock,
    Adjustment,
    Return,
}

// --- STOCK LEDGER (Histórico, somente inserção) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StockLedgerEntry {
    pub id: i64,
    pub tenant_id: i64,
    pub product_id: i64,
    // Preenchido apenas nas consultas de histórico (JOIN com products)
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Positivo = entrada, negativo = saída. Sempre o valor efetivamente aplicado.
    pub change_amount: i32,
    pub category: StockCategory,
    pub reason: String,
    pub reference_id: Option<i64>,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Resultado de uma movimentação: o novo saldo e o lançamento gravado.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockAdjustment {
    pub new_stock: i32,
    pub entry: StockLedgerEntry,
}

/// Campos editáveis de um produto (tudo menos estoque e tenant).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductFields {
    pub name: String,
    #[serde(default)]
    #[schema(example = "12.50")]
    pub price: Decimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "empty_metadata")]
    #[schema(value_type = Object)]
    pub metadata: Value,
}

fn empty_metadata() -> Value {
    Value::Object(Default::default())
}

/// Um lançamento ainda não gravado.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry<'a> {
    pub tenant_id: i64,
    pub product_id: i64,
    pub change_amount: i32,
    pub category: StockCategory,
    pub reason: &'a str,
    pub reference_id: Option<i64>,
    pub user_id: i64,
    pub username: &'a str,
}
