// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::get_config,

        // --- Products ---
        handlers::inventory::list_products,
        handlers::inventory::get_product,
        handlers::inventory::create_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,

        // --- Stock ---
        handlers::inventory::adjust_stock,
        handlers::inventory::restock,
        handlers::inventory::stock_history,
        handlers::inventory::product_stock_history,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::daily_sales,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
        handlers::orders::bulk_decrement_stock,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,

        // --- Tenancy ---
        handlers::tenancy::list_tenants,
        handlers::tenancy::create_tenant,
        handlers::tenancy::update_tenant,
        handlers::tenancy::suspend_tenant,
        handlers::tenancy::impersonate,
        handlers::tenancy::platform_stats,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::UserSummary,
            models::auth::TenantSummary,
            models::auth::AuthResponse,
            models::auth::Principal,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::StockCategory,
            models::inventory::StockLedgerEntry,
            models::inventory::StockAdjustment,
            handlers::inventory::CreateProductPayload,
            handlers::inventory::UpdateProductPayload,
            handlers::inventory::AdjustStockPayload,
            handlers::inventory::RestockPayload,

            // --- Orders ---
            models::orders::OrderStatus,
            models::orders::Order,
            models::orders::OrderLineItem,
            models::orders::CheckoutRequest,
            models::orders::StockDecrement,
            models::orders::OrderCreated,
            models::orders::DailySales,
            handlers::orders::UpdateOrderStatusPayload,

            // --- CRM ---
            models::crm::Customer,
            models::crm::Supplier,
            models::crm::CustomerFields,
            models::crm::SupplierFields,

            // --- Tenancy ---
            models::tenancy::BusinessType,
            models::tenancy::TenantStatus,
            models::tenancy::Tenant,
            models::tenancy::TenantWithOwner,
            models::tenancy::ImpersonationResponse,
            models::tenancy::PlatformStats,
            models::tenancy::ClientConfig,
            models::tenancy::CreateTenantPayload,
            models::tenancy::UpdateTenantPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login e Sessão"),
        (name = "Products", description = "Catálogo de Produtos"),
        (name = "Stock", description = "Ajustes, Reposição e Histórico de Estoque"),
        (name = "Orders", description = "Vendas e Pedidos"),
        (name = "Users", description = "Equipe da Loja"),
        (name = "CRM", description = "Clientes e Fornecedores"),
        (name = "Tenancy", description = "Gestão de Lojas (Operador da Plataforma)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documento_contem_rotas_principais_e_esquema_jwt() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/superadmin/tenants/{id}/impersonate"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
