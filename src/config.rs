// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{CrmRepository, InventoryRepository, OrdersRepository, TenantRepository, UserRepository},
    services::{
        audit::{AuditSink, TracingAuditSink},
        auth::AuthService,
        crm_service::CrmService,
        inventory_service::InventoryService,
        order_service::OrderService,
        tenancy_service::TenantService,
        user_service::UserService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Credenciais do primeiro superadmin (opcional).
#[derive(Clone)]
pub struct BootstrapOperator {
    pub username: String,
    pub password: String,
}

// Não derivamos Debug: segredo e senha não podem parar em log.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub token_ttl: chrono::Duration,
    pub bootstrap_operator: Option<BootstrapOperator>,
}

impl Config {
    /// Lê `.env` (se existir) e depois o ambiente do processo.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} deve ser definida", key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {}", v))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let ttl_hours = match lookup("TOKEN_TTL_HOURS") {
            Some(v) => v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| anyhow!("TOKEN_TTL_HOURS inválido: {}", v))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let bootstrap_operator = match (lookup("SUPERADMIN_USERNAME"), lookup("SUPERADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapOperator { username, password }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "SUPERADMIN_USERNAME e SUPERADMIN_PASSWORD devem ser definidas juntas"
                ))
            }
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            token_ttl: chrono::Duration::hours(ttl_hours),
            bootstrap_operator,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub order_service: OrderService,
    pub crm_service: CrmService,
    pub user_service: UserService,
    pub tenant_service: TenantService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config, Arc::new(TracingAuditSink)))
    }

    /// Monta o gráfico de dependências sobre uma pool já criada.
    pub fn from_pool(db_pool: PgPool, config: Config, audit: Arc<dyn AuditSink>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let orders_repo = OrdersRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            config.jwt_secret.clone(),
            config.token_ttl,
        );
        let inventory_service = InventoryService::new(inventory_repo, db_pool.clone());
        let order_service = OrderService::new(orders_repo, inventory_service.clone(), db_pool.clone());
        let crm_service = CrmService::new(crm_repo);
        let user_service = UserService::new(user_repo.clone(), db_pool.clone());
        let tenant_service = TenantService::new(
            tenant_repo,
            user_repo,
            auth_service.clone(),
            audit,
            db_pool.clone(),
        );

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            inventory_service,
            order_service,
            crm_service,
            user_service,
            tenant_service,
        }
    }
}
