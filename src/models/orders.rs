// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::error::AppError;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Served,
    Completed,
}

impl OrderStatus {
    /// Tabela de transições permitidas.
    /// `paid -> completed` cobre o balcão de varejo, onde não há etapa de "servido".
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Paid, Served) | (Paid, Completed) | (Served, Completed)
        )
    }

    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidOperation(format!(
                "Transição de status inválida: {:?} -> {:?}.",
                self, next
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub tenant_id: i64,
    pub status: OrderStatus,
    #[schema(example = "150.50")]
    pub total: Decimal,
    /// Snapshot imutável do pedido no momento do checkout.
    #[schema(value_type = Object)]
    pub details: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Um item do carrinho como enviado pelo PDV. Campos extras são preservados no snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineItem {
    pub product_id: Option<i64>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    #[schema(example = "25.00")]
    pub unit_price: Decimal,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl OrderLineItem {
    /// Só linhas com produto e quantidade positiva movimentam estoque.
    pub fn stock_target(&self) -> Option<(i64, i32)> {
        match self.product_id {
            Some(product_id) if self.quantity > 0 => Some((product_id, self.quantity)),
            _ => None,
        }
    }
}

/// O que o chamador informa ao fechar uma venda. Totais vêm calculados pelo PDV.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<OrderLineItem>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub payment_method: String,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

impl CheckoutRequest {
    /// Soma recalculada no servidor a partir dos preços unitários de cada linha.
    /// `None` quando a conta estoura o limite do `Decimal`.
    pub fn computed_subtotal(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            item.unit_price
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|line| acc.checked_add(line))
        })
    }

    /// Snapshot gravado em `orders.details`.
    pub fn details_snapshot(&self, created_at: DateTime<Utc>) -> Value {
        serde_json::json!({
            "items": self.items,
            "subtotal": self.subtotal,
            "tax": self.tax,
            "discount": self.discount,
            "payment_method": self.payment_method,
            "table_number": self.table_number,
            "customer_name": self.customer_name,
            "customer_phone": self.customer_phone,
            "created_at": created_at.to_rfc3339(),
        })
    }
}

/// Uma linha da baixa em lote (pré-checkout).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockDecrement {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreated {
    pub order_id: i64,
    pub order_number: i64,
    pub status: OrderStatus,
    #[schema(example = "150.50")]
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailySales {
    pub date: chrono::NaiveDate,
    #[schema(example = "1520.00")]
    pub total_sales: Decimal,
    pub order_count: i64,
    #[schema(example = "76.00")]
    pub average_order: Decimal,
}
