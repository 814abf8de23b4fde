// src/services/crm_service.rs

use crate::{
    common::error::AppError,
    db::CrmRepository,
    middleware::tenancy::TenantScope,
    models::crm::{Customer, CustomerFields, Supplier, SupplierFields},
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  1. CLIENTES
    // =========================================================================

    pub async fn list_customers(&self, scope: &TenantScope, search: Option<&str>) -> Result<Vec<Customer>, AppError> {
        self.repo.list_customers(scope, search).await
    }

    pub async fn get_customer(&self, scope: &TenantScope, id: i64) -> Result<Customer, AppError> {
        self.repo
            .find_customer(scope, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cliente {} não encontrado.", id)))
    }

    pub async fn create_customer(&self, scope: &TenantScope, fields: &CustomerFields) -> Result<Customer, AppError> {
        let tenant_id = scope.target_tenant()?;
        let customer = self.repo.create_customer(tenant_id, fields).await?;
        tracing::info!(tenant_id, customer_id = customer.id, "cliente criado");
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        scope: &TenantScope,
        id: i64,
        fields: &CustomerFields,
    ) -> Result<Customer, AppError> {
        self.get_customer(scope, id).await?;
        self.repo.update_customer(id, fields).await
    }

    pub async fn delete_customer(&self, scope: &TenantScope, id: i64) -> Result<(), AppError> {
        self.get_customer(scope, id).await?;
        self.repo.delete_customer(id).await
    }

    // =========================================================================
    //  2. FORNECEDORES
    // =========================================================================

    pub async fn list_suppliers(&self, scope: &TenantScope, search: Option<&str>) -> Result<Vec<Supplier>, AppError> {
        self.repo.list_suppliers(scope, search).await
    }

    pub async fn get_supplier(&self, scope: &TenantScope, id: i64) -> Result<Supplier, AppError> {
        self.repo
            .find_supplier(scope, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fornecedor {} não encontrado.", id)))
    }

    pub async fn create_supplier(&self, scope: &TenantScope, fields: &SupplierFields) -> Result<Supplier, AppError> {
        let tenant_id = scope.target_tenant()?;
        let supplier = self.repo.create_supplier(tenant_id, fields).await?;
        tracing::info!(tenant_id, supplier_id = supplier.id, "fornecedor criado");
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        scope: &TenantScope,
        id: i64,
        fields: &SupplierFields,
    ) -> Result<Supplier, AppError> {
        self.get_supplier(scope, id).await?;
        self.repo.update_supplier(id, fields).await
    }

    pub async fn delete_supplier(&self, scope: &TenantScope, id: i64) -> Result<(), AppError> {
        self.get_supplier(scope, id).await?;
        self.repo.delete_supplier(id).await
    }
}
