// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pos_backend::{
    config::{AppState, Config},
    middleware::tenancy::TenantScope,
    models::{
        auth::{Principal, Role},
        inventory::{Product, ProductFields},
        tenancy::{BusinessType, CreateTenantPayload},
    },
    routes,
    services::audit::{AuditSink, TracingAuditSink},
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "segredo_de_teste_com_32_caracteres!!";

/// Sobe o estado da aplicação contra o Postgres de `DATABASE_URL`.
/// Sem a variável, devolve `None` e o teste é pulado.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn try_new() -> Option<Self> {
        Self::try_with_audit(Arc::new(TracingAuditSink)).await
    }

    pub async fn try_with_audit(audit: Arc<dyn AuditSink>) -> Option<Self> {
        let _ = dotenvy::dotenv();
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL não definida; teste de integração pulado");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .expect("conectar no banco de teste");

        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("rodar migrações");

        let config = Config::from_lookup(|key: &str| match key {
            "DATABASE_URL" => Some(database_url.clone()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })
        .expect("config de teste");

        let state = AppState::from_pool(pool, config, audit);
        let router = routes::app(state.clone());
        Some(Self { state, router })
    }

    /// Operador sintético: não precisa existir no banco para as operações de plataforma.
    pub fn operator(&self) -> Principal {
        Principal::new(0, "operador-teste", None, Role::Superadmin).expect("operador")
    }

    /// Cria uma loja nova com dono; nomes únicos para os testes não colidirem.
    pub async fn tenant_with_owner(&self) -> (i64, Principal, String) {
        let suffix = Uuid::new_v4().simple().to_string();
        let username = format!("dono_{}", &suffix[..12]);
        let payload = CreateTenantPayload {
            name: format!("Loja {}", &suffix[..8]),
            business_type: BusinessType::Retail,
            address: None,
            admin_username: username.clone(),
            admin_password: "senha123".into(),
            modules_enabled: vec![],
            subscription_plan: "basic".into(),
        };

        let created = self
            .state
            .tenant_service
            .create_tenant_with_owner(&self.operator(), &payload)
            .await
            .expect("criar loja");

        let owner = Principal::new(created.user.id, username.clone(), Some(created.tenant.id), Role::Owner)
            .expect("principal do dono");
        (created.tenant.id, owner, username)
    }

    pub async fn product(&self, owner: &Principal, name: &str, stock: i32) -> Product {
        let fields = ProductFields {
            name: name.to_string(),
            price: rust_decimal::Decimal::new(1000, 2),
            category: Some("geral".into()),
            image_url: None,
            metadata: serde_json::json!({}),
        };
        self.state
            .inventory_service
            .create_product(owner, &TenantScope::for_principal(owner), &fields, stock)
            .await
            .expect("criar produto")
    }

    pub async fn stock_of(&self, product_id: i64) -> i32 {
        sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&self.state.db_pool)
            .await
            .expect("ler estoque")
    }

    pub async fn ledger_sum(&self, product_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(change_amount), 0)::BIGINT FROM stock_ledger WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.state.db_pool)
        .await
        .expect("somar razão")
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("resposta do router");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("corpo").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}
