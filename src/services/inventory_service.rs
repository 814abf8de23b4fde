// src/services/inventory_service.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    middleware::tenancy::TenantScope,
    models::{
        auth::Principal,
        inventory::{
            NewLedgerEntry, Product, ProductFields, StockAdjustment, StockCategory, StockLedgerEntry,
        },
    },
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

// Textos gravados em `stock_ledger.reason`. São um formato fixo lido pelos PDVs e relatórios,
// por isso ficam em inglês e não seguem o idioma das mensagens de erro.
pub(crate) const INITIAL_STOCK_REASON: &str = "Initial stock";
pub(crate) const BULK_DECREMENT_REASON: &str = "Bulk stock decrement";

pub(crate) fn sale_reason(order_id: i64) -> String {
    format!("Order #{}", order_id)
}

fn clamped_reason(reason: &str, requested: i32) -> String {
    format!("{} (requested {})", reason, requested)
}

/// O que fazer quando uma saída levaria o saldo abaixo de zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockPolicy {
    /// Rejeita com `InvalidOperation` (ajustes manuais, entradas, devoluções).
    Strict,
    /// Baixa só o que existe e para em zero (venda/checkout nunca falha por saldo).
    ClampAtZero,
}

/// O efeito de uma movimentação depois de aplicada a política.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub new_stock: i32,
    /// O delta realmente aplicado; é ele que vai para o livro-razão.
    pub applied_delta: i32,
}

impl StockPolicy {
    pub fn for_category(category: StockCategory) -> Self {
        match category {
            StockCategory::Sale => StockPolicy::ClampAtZero,
            StockCategory::Restock | StockCategory::Adjustment | StockCategory::Return => {
                StockPolicy::Strict
            }
        }
    }

    pub fn apply(self, current: i32, delta: i32) -> Result<StockChange, AppError> {
        let target = current.checked_add(delta).ok_or_else(|| {
            AppError::InvalidOperation("Quantidade fora do limite permitido.".into())
        })?;

        if target >= 0 {
            return Ok(StockChange { new_stock: target, applied_delta: delta });
        }

        match self {
            StockPolicy::Strict => Err(AppError::InvalidOperation(
                "O estoque não pode ficar negativo.".into(),
            )),
            StockPolicy::ClampAtZero => Ok(StockChange { new_stock: 0, applied_delta: -current }),
        }
    }
}

/// Pedido de movimentação para `adjust`.
#[derive(Debug, Clone)]
pub struct LedgerRequest<'a> {
    pub product_id: i64,
    pub delta: i32,
    pub category: StockCategory,
    pub reason: &'a str,
    pub reference_id: Option<i64>,
}

/// O livro-razão de estoque: o único lugar que altera `products.stock`, e sempre
/// junto com um lançamento, na mesma transação.
#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // =========================================================================
    //  LIVRO-RAZÃO
    // =========================================================================

    /// Movimenta o estoque de um produto e grava o lançamento (ambos ou nenhum).
    pub async fn adjust(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        request: LedgerRequest<'_>,
    ) -> Result<StockAdjustment, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Busca e trava o produto; aplica o escopo
        let product = self
            .lock_in_scope(&mut tx, scope, request.product_id)
            .await?
            .ok_or_else(|| product_not_found(request.product_id))?;

        // 3. Política + saldo + lançamento
        let adjustment = self
            .book(
                &mut tx,
                principal,
                &product,
                request.category,
                request.delta,
                request.reason,
                request.reference_id,
            )
            .await?;

        // 4. Commit. Se cair antes daqui, o drop do `tx` desfaz tudo.
        tx.commit().await?;

        tracing::info!(
            tenant_id = product.tenant_id,
            product_id = product.id,
            category = ?request.category,
            delta = adjustment.entry.change_amount,
            new_stock = adjustment.new_stock,
            "estoque movimentado"
        );
        Ok(adjustment)
    }

    /// Ajuste manual (quebra, validade, inventário): nunca deixa o saldo negativo.
    pub async fn adjust_stock(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        product_id: i64,
        change_amount: i32,
        reason: &str,
    ) -> Result<StockAdjustment, AppError> {
        if change_amount == 0 {
            return Err(AppError::InvalidOperation("A quantidade do ajuste não pode ser zero.".into()));
        }

        self.adjust(
            principal,
            scope,
            LedgerRequest {
                product_id,
                delta: change_amount,
                category: StockCategory::Adjustment,
                reason,
                reference_id: None,
            },
        )
        .await
    }

    /// Entrada de mercadoria, opcionalmente vinculada a um fornecedor.
    pub async fn restock(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        product_id: i64,
        quantity: i32,
        supplier_id: Option<i64>,
        notes: Option<&str>,
    ) -> Result<StockAdjustment, AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidOperation("A quantidade de entrada deve ser positiva.".into()));
        }

        let reason = restock_reason(notes);
        self.adjust(
            principal,
            scope,
            LedgerRequest {
                product_id,
                delta: quantity,
                category: StockCategory::Restock,
                reason: &reason,
                reference_id: supplier_id,
            },
        )
        .await
    }

    pub async fn history(
        &self,
        scope: &TenantScope,
        product_id: Option<i64>,
        category: Option<StockCategory>,
        limit: Option<i64>,
    ) -> Result<Vec<StockLedgerEntry>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit < 0 {
            return Err(AppError::InvalidOperation("O limite não pode ser negativo.".into()));
        }

        self.inventory_repo
            .ledger_history(scope, product_id, category, limit)
            .await
    }

    // --- Blocos usados dentro de transações de outros serviços ---

    /// Trava o produto; se existir mas for de outro tenant, `AccessDenied`.
    pub(crate) async fn lock_in_scope(
        &self,
        conn: &mut PgConnection,
        scope: &TenantScope,
        product_id: i64,
    ) -> Result<Option<Product>, AppError> {
        let product = self.inventory_repo.lock_product(&mut *conn, product_id).await?;
        if let Some(p) = &product {
            scope.ensure(p.tenant_id)?;
        }
        Ok(product)
    }

    pub(crate) async fn lock_product(
        &self,
        conn: &mut PgConnection,
        product_id: i64,
    ) -> Result<Option<Product>, AppError> {
        self.inventory_repo.lock_product(conn, product_id).await
    }

    /// Baixa de venda (política de corte em zero) sobre um produto já travado.
    pub(crate) async fn sale_decrement(
        &self,
        conn: &mut PgConnection,
        principal: &Principal,
        product: &Product,
        quantity: i32,
        reason: &str,
        reference_id: Option<i64>,
    ) -> Result<StockAdjustment, AppError> {
        self.book(conn, principal, product, StockCategory::Sale, -quantity, reason, reference_id)
            .await
    }

    /// Aplica a política da categoria, grava o saldo e o lançamento.
    /// O produto precisa ter sido travado na mesma conexão/transação.
    async fn book(
        &self,
        conn: &mut PgConnection,
        principal: &Principal,
        product: &Product,
        category: StockCategory,
        delta: i32,
        reason: &str,
        reference_id: Option<i64>,
    ) -> Result<StockAdjustment, AppError> {
        let change = StockPolicy::for_category(category).apply(product.stock, delta)?;

        if change.applied_delta != delta {
            tracing::warn!(
                tenant_id = product.tenant_id,
                product_id = product.id,
                requested = delta,
                applied = change.applied_delta,
                "baixa de venda cortada em zero"
            );
        }

        self.inventory_repo
            .set_stock(&mut *conn, product.id, change.new_stock)
            .await?;

        let clamped;
        let reason = if change.applied_delta != delta {
            clamped = clamped_reason(reason, -delta);
            clamped.as_str()
        } else {
            reason
        };

        let entry = self
            .inventory_repo
            .append_ledger_entry(
                &mut *conn,
                &NewLedgerEntry {
                    tenant_id: product.tenant_id,
                    product_id: product.id,
                    change_amount: change.applied_delta,
                    category,
                    reason,
                    reference_id,
                    user_id: principal.user_id(),
                    username: principal.username(),
                },
            )
            .await?;

        Ok(StockAdjustment { new_stock: change.new_stock, entry })
    }

    // =========================================================================
    //  CATÁLOGO
    // =========================================================================

    pub async fn list_products(
        &self,
        scope: &TenantScope,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_products(scope, category, search).await
    }

    pub async fn get_product(&self, scope: &TenantScope, id: i64) -> Result<Product, AppError> {
        self.inventory_repo
            .find_product(scope, id)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Cria o produto; o estoque inicial entra como lançamento de reposição na mesma transação.
    pub async fn create_product(
        &self,
        principal: &Principal,
        scope: &TenantScope,
        fields: &ProductFields,
        initial_stock: i32,
    ) -> Result<Product, AppError> {
        if initial_stock < 0 {
            return Err(AppError::InvalidOperation("O estoque inicial não pode ser negativo.".into()));
        }
        let tenant_id = scope.target_tenant()?;

        let mut tx = self.pool.begin().await?;

        let mut product = self
            .inventory_repo
            .create_product(&mut *tx, tenant_id, fields)
            .await?;

        if initial_stock > 0 {
            let booked = self
                .book(
                    &mut tx,
                    principal,
                    &product,
                    StockCategory::Restock,
                    initial_stock,
                    INITIAL_STOCK_REASON,
                    None,
                )
                .await?;
            product.stock = booked.new_stock;
        }

        tx.commit().await?;

        tracing::info!(tenant_id, product_id = product.id, initial_stock, "produto criado");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        scope: &TenantScope,
        id: i64,
        fields: &ProductFields,
    ) -> Result<Product, AppError> {
        // Garante existência + escopo antes de escrever
        self.get_product(scope, id).await?;
        self.inventory_repo.update_product(id, fields).await
    }

    pub async fn delete_product(&self, scope: &TenantScope, id: i64) -> Result<(), AppError> {
        self.get_product(scope, id).await?;
        self.inventory_repo.soft_delete_product(id).await?;
        tracing::info!(product_id = id, "produto removido (soft delete)");
        Ok(())
    }
}

pub(crate) fn product_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Produto {} não encontrado.", id))
}

fn restock_reason(notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => format!("Restock: {}", notes),
        None => "Restock".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_policy_applies_within_stock() {
        let change = StockPolicy::Strict.apply(10, -3).unwrap();
        assert_eq!(change, StockChange { new_stock: 7, applied_delta: -3 });
    }

    #[test]
    fn strict_policy_rejects_negative_result() {
        let err = StockPolicy::Strict.apply(7, -20).unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[test]
    fn strict_policy_allows_draining_to_exactly_zero() {
        assert_eq!(StockPolicy::Strict.apply(5, -5).unwrap().new_stock, 0);
    }

    #[test]
    fn clamp_policy_stops_at_zero_and_records_effective_delta() {
        let change = StockPolicy::ClampAtZero.apply(10, -15).unwrap();
        assert_eq!(change, StockChange { new_stock: 0, applied_delta: -10 });

        let empty = StockPolicy::ClampAtZero.apply(0, -4).unwrap();
        assert_eq!(empty, StockChange { new_stock: 0, applied_delta: 0 });
    }

    #[test]
    fn only_sales_are_clamped() {
        assert_eq!(StockPolicy::for_category(StockCategory::Sale), StockPolicy::ClampAtZero);
        assert_eq!(StockPolicy::for_category(StockCategory::Adjustment), StockPolicy::Strict);
        assert_eq!(StockPolicy::for_category(StockCategory::Restock), StockPolicy::Strict);
        assert_eq!(StockPolicy::for_category(StockCategory::Return), StockPolicy::Strict);
    }

    #[test]
    fn overflow_is_an_invalid_operation() {
        assert!(matches!(
            StockPolicy::Strict.apply(i32::MAX, 1),
            Err(AppError::InvalidOperation(_))
        ));
    }

    #[test]
    fn sequential_concurrent_scenario_never_loses_an_update() {
        // -5 e -3 sobre saldo 6, serializados pela trava de linha: um aplica, o outro falha.
        let first = StockPolicy::Strict.apply(6, -5).unwrap();
        assert_eq!(first.new_stock, 1);
        assert!(StockPolicy::Strict.apply(first.new_stock, -3).is_err());

        // Pela via de venda, os dois aplicam e o saldo termina em zero.
        let a = StockPolicy::ClampAtZero.apply(6, -5).unwrap();
        let b = StockPolicy::ClampAtZero.apply(a.new_stock, -3).unwrap();
        assert_eq!(b.new_stock, 0);
        assert_eq!(a.applied_delta + b.applied_delta, -6);
    }

    #[test]
    fn restock_reason_includes_notes_when_present() {
        assert_eq!(restock_reason(None), "Restock");
        assert_eq!(restock_reason(Some("  ")), "Restock");
        assert_eq!(restock_reason(Some("NF 1234")), "Restock: NF 1234");
    }

    #[test]
    fn ledger_reason_texts_keep_their_fixed_format() {
        assert_eq!(sale_reason(42), "Order #42");
        assert_eq!(clamped_reason(&sale_reason(42), 15), "Order #42 (requested 15)");
        assert_eq!(INITIAL_STOCK_REASON, "Initial stock");
        assert_eq!(BULK_DECREMENT_REASON, "Bulk stock decrement");
    }
}
