// src/services/order_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{OrdersRepository, orders_repo::OrderFilter},
    middleware::tenancy::TenantScope,
    models::{
        auth::Principal,
        inventory::StockAdjustment,
        orders::{CheckoutRequest, DailySales, Order, OrderCreated, OrderStatus, StockDecrement},
    },
    services::inventory_service::{
        product_not_found, sale_reason, InventoryService, BULK_DECREMENT_REASON,
    },
};

pub const DEFAULT_ORDER_LIMIT: i64 = 50;

/// Fechamento de vendas: grava o pedido e baixa o estoque pelo livro-razão, tudo numa transação.
#[derive(Clone)]
pub struct OrderService {
    orders_repo: OrdersRepository,
    inventory_service: InventoryService,
    pool: PgPool,
}

impl OrderService {
    pub fn new(orders_repo: OrdersRepository, inventory_service: InventoryService, pool: PgPool) -> Self {
        Self { orders_repo, inventory_service, pool }
    }

    /// Cria o pedido já pago e dá baixa em cada linha com produto.
    ///
    /// Linhas cujo produto não existe (ou é de outra loja) são puladas: a venda não falha por isso.
    /// A baixa de venda corta em zero em vez de rejeitar.
    pub async fn settle(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        request: &CheckoutRequest,
    ) -> Result<OrderCreated, AppError> {
        let tenant_id = scope.target_tenant()?;

        // Os totais vêm do PDV; só registramos a divergência.
        match request.computed_subtotal() {
            Some(computed) if computed != request.subtotal => {
                tracing::warn!(
                    tenant_id,
                    informed = %request.subtotal,
                    computed = %computed,
                    "subtotal informado difere da soma das linhas"
                );
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    tenant_id,
                    informed = %request.subtotal,
                    "soma das linhas não calculável (estouro); subtotal informado mantido"
                );
            }
        }

        let created_at = Utc::now();
        let details = request.details_snapshot(created_at);

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Grava o pedido
        let order = self
            .orders_repo
            .create_order(&mut *tx, tenant_id, OrderStatus::Paid, request.total, &details, created_at)
            .await?;

        // 3. Baixa de estoque, sempre na ordem do id do produto (evita deadlock entre caixas)
        let reason = sale_reason(order.id);
        for (product_id, quantity) in stock_targets(request) {
            let product = match self.inventory_service.lock_product(&mut tx, product_id).await? {
                Some(p) if p.tenant_id == tenant_id => p,
                Some(_) => {
                    tracing::warn!(order_id = order.id, product_id, "produto de outra loja ignorado na venda");
                    continue;
                }
                None => {
                    tracing::warn!(order_id = order.id, product_id, "produto inexistente ignorado na venda");
                    continue;
                }
            };

            self.inventory_service
                .sale_decrement(&mut tx, principal, &product, quantity, &reason, Some(order.id))
                .await?;
        }

        // 4. Commit
        tx.commit().await?;

        tracing::info!(tenant_id, order_id = order.id, total = %order.total, "venda registrada");
        Ok(OrderCreated {
            order_id: order.id,
            order_number: order.id,
            status: order.status,
            total: order.total,
        })
    }

    /// Baixa em lote fora de um pedido (reserva pré-checkout).
    /// Diferente da venda: produto ausente derruba o lote inteiro com `NotFound`.
    pub async fn bulk_decrement(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        items: &[StockDecrement],
    ) -> Result<Vec<StockAdjustment>, AppError> {
        if items.iter().any(|i| i.quantity <= 0) {
            return Err(AppError::InvalidOperation("As quantidades devem ser positivas.".into()));
        }

        let mut ordered: Vec<&StockDecrement> = items.iter().collect();
        ordered.sort_by_key(|i| i.product_id);

        let mut tx = self.pool.begin().await?;

        let mut results = Vec::with_capacity(ordered.len());
        for item in ordered {
            let product = self
                .inventory_service
                .lock_in_scope(&mut tx, scope, item.product_id)
                .await?
                .ok_or_else(|| product_not_found(item.product_id))?;

            let adjustment = self
                .inventory_service
                .sale_decrement(&mut tx, principal, &product, item.quantity, BULK_DECREMENT_REASON, None)
                .await?;
            results.push(adjustment);
        }

        tx.commit().await?;

        tracing::info!(user_id = principal.user_id(), lines = results.len(), "baixa em lote aplicada");
        Ok(results)
    }

    pub async fn list_orders(&self, scope: &TenantScope, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        if filter.limit < 0 {
            return Err(AppError::InvalidOperation("O limite não pode ser negativo.".into()));
        }
        self.orders_repo.list_orders(scope, &filter).await
    }

    pub async fn get_order(&self, scope: &TenantScope, id: i64) -> Result<Order, AppError> {
        self.orders_repo
            .find_order(scope, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pedido {} não encontrado.", id)))
    }

    pub async fn update_status(
        &self,
        scope: &TenantScope,
        id: i64,
        next: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self.get_order(scope, id).await?;
        let status = order.status.transition_to(next)?;

        // Compare-and-set: se o status mudou desde a leitura, a transição não vale mais.
        let updated = self
            .orders_repo
            .set_status(id, order.status, status)
            .await?
            .ok_or_else(|| {
                AppError::InvalidOperation(format!(
                    "O status do pedido {} foi alterado por outra operação; tente novamente.",
                    id
                ))
            })?;
        tracing::info!(order_id = id, from = ?order.status, to = ?status, "status do pedido alterado");
        Ok(updated)
    }

    pub async fn daily_sales(&self, scope: &TenantScope, date: Option<NaiveDate>) -> Result<DailySales, AppError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let totals = self.orders_repo.sales_totals(scope, date).await?;

        Ok(DailySales {
            date,
            total_sales: totals.total_sales,
            order_count: totals.order_count,
            average_order: average_order(totals.total_sales, totals.order_count),
        })
    }
}

/// Linhas que movimentam estoque, ordenadas por produto.
fn stock_targets(request: &CheckoutRequest) -> Vec<(i64, i32)> {
    let mut targets: Vec<(i64, i32)> = request.items.iter().filter_map(|i| i.stock_target()).collect();
    targets.sort_by_key(|(product_id, _)| *product_id);
    targets
}

fn average_order(total: Decimal, count: i64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout(items: serde_json::Value) -> CheckoutRequest {
        serde_json::from_value(serde_json::json!({ "items": items, "total": 0 })).unwrap()
    }

    #[test]
    fn stock_targets_are_sorted_and_skip_lines_without_products() {
        let request = checkout(serde_json::json!([
            { "product_id": 9, "quantity": 1 },
            { "name": "Taxa de serviço", "quantity": 1 },
            { "product_id": 2, "quantity": 3 },
            { "product_id": 5, "quantity": 0 }
        ]));

        assert_eq!(stock_targets(&request), vec![(2, 3), (9, 1)]);
    }

    #[test]
    fn average_order_handles_empty_days() {
        assert_eq!(average_order(Decimal::ZERO, 0), Decimal::ZERO);
        assert_eq!(average_order(Decimal::new(10000, 2), 3), Decimal::new(3333, 2));
    }
}
