// src/db/orders_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Executor, FromRow, PgPool, Postgres};

use crate::{
    common::error::AppError,
    middleware::tenancy::TenantScope,
    models::orders::{Order, OrderStatus},
};

/// Filtros opcionais da listagem de pedidos.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: i64,
}

#[derive(Debug, FromRow)]
pub struct SalesTotals {
    pub total_sales: Decimal,
    pub order_count: i64,
}

#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        tenant_id: i64,
        status: OrderStatus,
        total: Decimal,
        details: &Value,
        created_at: DateTime<Utc>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (tenant_id, status, total, details, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(status)
        .bind(total)
        .bind(details)
        .bind(created_at)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn find_order(&self, scope: &TenantScope, id: i64) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(o) = &order {
            scope.ensure(o.tenant_id)?;
        }
        Ok(order)
    }

    pub async fn list_orders(&self, scope: &TenantScope, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at <= $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(scope.tenant_id())
        .bind(filter.status)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Troca o status só se o pedido ainda estiver em `from`.
    /// `None` = outro caixa mudou o status antes (ou o pedido sumiu).
    pub async fn set_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(to)
        .bind(from)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// Soma das vendas já pagas (pagas, servidas ou concluídas) de um dia (UTC).
    pub async fn sales_totals(&self, scope: &TenantScope, date: NaiveDate) -> Result<SalesTotals, AppError> {
        let totals = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT COALESCE(SUM(total), 0) AS total_sales, COUNT(*) AS order_count
            FROM orders
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
              AND (created_at AT TIME ZONE 'UTC')::date = $2
              AND status IN ('paid', 'served', 'completed')
            "#,
        )
        .bind(scope.tenant_id())
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }
}
