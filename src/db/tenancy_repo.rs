// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::tenancy::{BusinessType, PlatformStats, Tenant, TenantStatus},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn list_all(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tenants)
    }

    /// Cria um novo tenant (Loja) na base de dados.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E, // Aceita um executor (pool ou transação)
        name: &str,
        business_type: BusinessType,
        address: Option<&str>,
        subscription_plan: &str,
        modules_enabled: &[String],
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, business_type, address, status, subscription_plan, modules_enabled)
            VALUES ($1, $2, $3, 'active', $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(business_type)
        .bind(address)
        .bind(subscription_plan)
        .bind(modules_enabled)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    /// Grava a linha inteira do tenant.
    pub async fn update_tenant(&self, tenant: &Tenant) -> Result<Tenant, AppError> {
        let updated = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET name = $2, business_type = $3, address = $4, status = $5,
                subscription_plan = $6, modules_enabled = $7, expires_at = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(tenant.business_type)
        .bind(&tenant.address)
        .bind(tenant.status)
        .bind(&tenant.subscription_plan)
        .bind(&tenant.modules_enabled)
        .bind(tenant.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    pub async fn set_status(&self, id: i64, status: TenantStatus) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats, AppError> {
        let stats = sqlx::query_as::<_, PlatformStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tenants WHERE status = 'active') AS total_tenants,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM orders) AS total_orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
