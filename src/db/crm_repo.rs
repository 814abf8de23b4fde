// src/db/crm_repo.rs

use sqlx::PgPool;

use crate::{
    common::{db_utils::like_pattern, error::AppError},
    middleware::tenancy::TenantScope,
    models::crm::{Customer, CustomerFields, Supplier, SupplierFields},
};

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    /// Lista clientes da loja; `search` procura em nome, telefone e e-mail.
    pub async fn list_customers(
        &self,
        scope: &TenantScope,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR phone ILIKE $2 OR email ILIKE $2)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(like_pattern(search))
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn find_customer(&self, scope: &TenantScope, id: i64) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(c) = &customer {
            scope.ensure(c.tenant_id)?;
        }
        Ok(customer)
    }

    pub async fn create_customer(&self, tenant_id: i64, fields: &CustomerFields) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (tenant_id, name, phone, email, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn update_customer(&self, id: i64, fields: &CustomerFields) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, email = $4, address = $5, notes = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn delete_customer(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn list_suppliers(
        &self,
        scope: &TenantScope,
        search: Option<&str>,
    ) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT * FROM suppliers
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2 OR contact_person ILIKE $2 OR phone ILIKE $2)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(like_pattern(search))
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn find_supplier(&self, scope: &TenantScope, id: i64) -> Result<Option<Supplier>, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(s) = &supplier {
            scope.ensure(s.tenant_id)?;
        }
        Ok(supplier)
    }

    pub async fn create_supplier(&self, tenant_id: i64, fields: &SupplierFields) -> Result<Supplier, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (tenant_id, name, contact_person, phone, email, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&fields.name)
        .bind(&fields.contact_person)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(supplier)
    }

    pub async fn update_supplier(&self, id: i64, fields: &SupplierFields) -> Result<Supplier, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $2, contact_person = $3, phone = $4, email = $5, address = $6, notes = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.contact_person)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(&fields.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(supplier)
    }

    pub async fn delete_supplier(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
