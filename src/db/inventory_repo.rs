// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::like_pattern, error::AppError},
    middleware::tenancy::TenantScope,
    models::inventory::{NewLedgerEntry, Product, ProductFields, StockCategory, StockLedgerEntry},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---
    // Leituras simples usam a pool principal, sempre filtradas pelo escopo.

    pub async fn list_products(
        &self,
        scope: &TenantScope,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, AppError> {
        // "All Items" é o filtro "todas as categorias" do PDV
        let category = category.filter(|c| !c.is_empty() && *c != "All Items");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE deleted_at IS NULL
              AND ($1::BIGINT IS NULL OR tenant_id = $1)
              AND ($2::TEXT IS NULL OR category = $2)
              AND ($3::TEXT IS NULL OR name ILIKE $3)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(scope.tenant_id())
        .bind(category)
        .bind(like_pattern(search))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Busca um produto e aplica o escopo: outro tenant = `AccessDenied`.
    pub async fn find_product(&self, scope: &TenantScope, id: i64) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(p) = &product {
            scope.ensure(p.tenant_id)?;
        }
        Ok(product)
    }

    /// Lê o produto travando a linha até o fim da transação (SELECT ... FOR UPDATE).
    /// Duas movimentações no mesmo produto serializam aqui.
    pub async fn lock_product<'e, E>(&self, executor: E, id: i64) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Cria o produto com estoque zero; o estoque inicial entra pelo livro-razão.
    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: i64,
        fields: &ProductFields,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, name, price, stock, category, image_url, metadata)
            VALUES ($1, $2, $3, 0, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&fields.name)
        .bind(fields.price)
        .bind(&fields.category)
        .bind(&fields.image_url)
        .bind(&fields.metadata)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    /// Atualiza os dados de catálogo. `stock` e `tenant_id` ficam de fora de propósito.
    pub async fn update_product(&self, id: i64, fields: &ProductFields) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, price = $3, category = $4, image_url = $5, metadata = $6, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(fields.price)
        .bind(&fields.category)
        .bind(&fields.image_url)
        .bind(&fields.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn soft_delete_product(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE products SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Grava o novo saldo. Só o InventoryService chama isto, sempre junto de um lançamento.
    pub async fn set_stock<'e, E>(&self, executor: E, product_id: i64, new_stock: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(product_id)
            .bind(new_stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    pub async fn append_ledger_entry<'e, E>(
        &self,
        executor: E,
        entry: &NewLedgerEntry<'_>,
    ) -> Result<StockLedgerEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, StockLedgerEntry>(
            r#"
            INSERT INTO stock_ledger (
                tenant_id, product_id, change_amount, category, reason, reference_id, user_id, username
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(entry.tenant_id)
        .bind(entry.product_id)
        .bind(entry.change_amount)
        .bind(entry.category)
        .bind(entry.reason)
        .bind(entry.reference_id)
        .bind(entry.user_id)
        .bind(entry.username)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Histórico do mais novo para o mais antigo. Mesmos argumentos, mesmo resultado
    /// (a menos de lançamentos novos).
    pub async fn ledger_history(
        &self,
        scope: &TenantScope,
        product_id: Option<i64>,
        category: Option<StockCategory>,
        limit: i64,
    ) -> Result<Vec<StockLedgerEntry>, AppError> {
        let entries = sqlx::query_as::<_, StockLedgerEntry>(
            r#"
            SELECT l.*, p.name AS product_name
            FROM stock_ledger l
            JOIN products p ON p.id = l.product_id
            WHERE ($1::BIGINT IS NULL OR l.tenant_id = $1)
              AND ($2::BIGINT IS NULL OR l.product_id = $2)
              AND ($3::stock_entry_category IS NULL OR l.category = $3)
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $4
            "#,
        )
        .bind(scope.tenant_id())
        .bind(product_id)
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
