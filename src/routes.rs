// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Monta o router completo da API.
pub fn app(app_state: AppState) -> Router {
    // Define as rotas públicas
    let public_routes = Router::new()
        .route("/login", post(handlers::auth::login));

    // Rotas de loja (protegidas pelo middleware; o escopo vem do principal)
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/config", get(handlers::auth::get_config))
        // Produtos
        .route(
            "/products",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route("/products/bulk-stock", post(handlers::orders::bulk_decrement_stock))
        .route(
            "/products/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        // Estoque
        .route("/stock/logs", get(handlers::inventory::stock_history))
        .route("/stock/logs/{product_id}", get(handlers::inventory::product_stock_history))
        .route("/stock/adjust", post(handlers::inventory::adjust_stock))
        .route("/stock/restock", post(handlers::inventory::restock))
        // Pedidos
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/daily-sales", get(handlers::orders::daily_sales))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route("/orders/{id}/status", patch(handlers::orders::update_order_status))
        // Equipe
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // Clientes
        .route(
            "/customers",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route(
            "/customers/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        // Fornecedores
        .route(
            "/suppliers",
            get(handlers::crm::list_suppliers).post(handlers::crm::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            get(handlers::crm::get_supplier)
                .put(handlers::crm::update_supplier)
                .delete(handlers::crm::delete_supplier),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas do operador da plataforma (auth_guard + RequireRole<OperatorOnly> nos handlers)
    let superadmin_routes = Router::new()
        .route("/stats", get(handlers::tenancy::platform_stats))
        .route(
            "/tenants",
            get(handlers::tenancy::list_tenants).post(handlers::tenancy::create_tenant),
        )
        .route(
            "/tenants/{id}",
            put(handlers::tenancy::update_tenant).delete(handlers::tenancy::suspend_tenant),
        )
        .route("/tenants/{id}/impersonate", post(handlers::tenancy::impersonate))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", public_routes.merge(protected_routes))
        .nest("/api/superadmin", superadmin_routes)
        .with_state(app_state)
}
