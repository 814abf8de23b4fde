// tests/inventory_ledger_test.rs
mod common;

use common::TestApp;
use pos_backend::{
    common::error::ErrorKind,
    middleware::tenancy::TenantScope,
    models::inventory::StockCategory,
};

#[tokio::test]
async fn adjustment_books_entry_and_rejects_negative_result() {
    let Some(app) = TestApp::try_new().await else { return };
    let (_, owner, _) = app.tenant_with_owner().await;
    let scope = TenantScope::for_principal(&owner);
    let product = app.product(&owner, "Café", 10).await;

    let adjustment = app
        .state
        .inventory_service
        .adjust_stock(&owner, &scope, product.id, -3, "Quebra")
        .await
        .unwrap();
    assert_eq!(adjustment.new_stock, 7);
    assert_eq!(adjustment.entry.change_amount, -3);
    assert_eq!(adjustment.entry.category, StockCategory::Adjustment);
    assert_eq!(adjustment.entry.username, owner.username());

    // Ajuste que deixaria o saldo negativo: rejeitado e nada muda
    let err = app
        .state
        .inventory_service
        .adjust_stock(&owner, &scope, product.id, -20, "Inventário")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(app.stock_of(product.id).await, 7);
    assert_eq!(app.ledger_sum(product.id).await, 7);
}

#[tokio::test]
async fn stock_always_equals_ledger_sum() {
    let Some(app) = TestApp::try_new().await else { return };
    let (_, owner, _) = app.tenant_with_owner().await;
    let scope = TenantScope::for_principal(&owner);
    let product = app.product(&owner, "Pão", 5).await;

    let service = &app.state.inventory_service;
    service.restock(&owner, &scope, product.id, 12, None, Some("NF 123")).await.unwrap();
    service.adjust_stock(&owner, &scope, product.id, -4, "Validade").await.unwrap();
    service.restock(&owner, &scope, product.id, 1, None, None).await.unwrap();

    assert_eq!(app.stock_of(product.id).await, 14);
    assert_eq!(app.ledger_sum(product.id).await, 14);

    let history = service
        .history(&scope, Some(product.id), Some(StockCategory::Restock), None)
        .await
        .unwrap();
    let reasons: Vec<&str> = history.iter().map(|e| e.reason.as_str()).collect();
    assert_eq!(reasons, vec!["Restock", "Restock: NF 123", "Initial stock"]);
}

#[tokio::test]
async fn concurrent_adjustments_never_overdraw() {
    let Some(app) = TestApp::try_new().await else { return };
    let (_, owner, _) = app.tenant_with_owner().await;
    let scope = TenantScope::for_principal(&owner);
    let product = app.product(&owner, "Suco", 6).await;

    let service = app.state.inventory_service.clone();
    let (a, b) = tokio::join!(
        service.adjust_stock(&owner, &scope, product.id, -5, "Caixa 1"),
        service.adjust_stock(&owner, &scope, product.id, -3, "Caixa 2"),
    );

    // Exatamente um dos dois passa; o outro vê o saldo já baixado
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let remaining = app.stock_of(product.id).await;
    assert!(remaining == 1 || remaining == 3);
    assert_eq!(app.ledger_sum(product.id).await, remaining as i64);
}

#[tokio::test]
async fn other_tenant_products_are_out_of_reach() {
    let Some(app) = TestApp::try_new().await else { return };
    let (_, owner_a, _) = app.tenant_with_owner().await;
    let (_, owner_b, _) = app.tenant_with_owner().await;
    let product = app.product(&owner_a, "Bolo", 4).await;

    let scope_b = TenantScope::for_principal(&owner_b);
    let err = app
        .state
        .inventory_service
        .adjust_stock(&owner_b, &scope_b, product.id, -1, "Tentativa")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert_eq!(app.stock_of(product.id).await, 4);

    // Listagem da outra loja não enxerga o produto
    let listed = app
        .state
        .inventory_service
        .list_products(&scope_b, None, None)
        .await
        .unwrap();
    assert!(listed.iter().all(|p| p.id != product.id));

    // O operador, sem filtro, enxerga
    let operator = app.operator();
    let all = TenantScope::for_principal(&operator);
    assert!(app.state.inventory_service.get_product(&all, product.id).await.is_ok());
}

#[tokio::test]
async fn ledger_rows_cannot_be_rewritten() {
    let Some(app) = TestApp::try_new().await else { return };
    let (_, owner, _) = app.tenant_with_owner().await;
    let product = app.product(&owner, "Água", 2).await;

    let update = sqlx::query("UPDATE stock_ledger SET change_amount = 99 WHERE product_id = $1")
        .bind(product.id)
        .execute(&app.state.db_pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM stock_ledger WHERE product_id = $1")
        .bind(product.id)
        .execute(&app.state.db_pool)
        .await;
    assert!(delete.is_err());
}
