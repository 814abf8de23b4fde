// src/models/tenancy.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::auth::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "business_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Retail,
    FoodBeverage,
    Service,
}

impl BusinessType {
    /// Funcionalidades de cliente liberadas por ramo de negócio.
    pub fn features(self) -> &'static [&'static str] {
        match self {
            BusinessType::Retail => &["barcode_scanner", "wholesale_pricing", "inventory"],
            BusinessType::FoodBeverage => &["table_map", "kitchen_print", "modifiers"],
            BusinessType::Service => &["kanban_board", "sms_notification", "calendar"],
        }
    }
}

// Ativo -> suspenso é o caminho comum, mas o operador pode reativar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tenant_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Trial,
    Suspended,
}

// ---
// Tenant (A "Loja")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub business_type: BusinessType,
    pub address: Option<String>,
    pub status: TenantStatus,
    pub subscription_plan: String,
    pub modules_enabled: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resultado de `createTenant`: a loja e o seu primeiro dono.
#[derive(Debug, Serialize, ToSchema)]
pub struct TenantWithOwner {
    pub tenant: Tenant,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImpersonationResponse {
    pub token: String,
    pub tenant: Tenant,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PlatformStats {
    pub total_tenants: i64,
    pub total_users: i64,
    pub total_orders: i64,
}

/// Configuração devolvida ao cliente (PDV) conforme quem está logado.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientConfig {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TenantStatus>,
    pub features: Vec<String>,
}

impl ClientConfig {
    pub fn for_operator() -> Self {
        Self {
            mode: "superadmin".into(),
            theme: None,
            status: None,
            features: ["tenant_management", "analytics", "system_settings"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }

    pub fn for_tenant(tenant: &Tenant) -> Self {
        let mode = serde_json::to_value(tenant.business_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        Self {
            mode,
            theme: Some("default".into()),
            status: Some(tenant.status),
            features: tenant.business_type.features().iter().map(|f| f.to_string()).collect(),
        }
    }
}

fn default_plan() -> String {
    "basic".to_string()
}

/// Criação de loja + primeiro dono (operação de plataforma).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da loja é obrigatório."))]
    pub name: String,
    pub business_type: BusinessType,
    pub address: Option<String>,
    #[validate(length(min = 3, max = 64, message = "O usuário deve ter entre 3 e 64 caracteres."))]
    pub admin_username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub admin_password: String,
    #[serde(default)]
    pub modules_enabled: Vec<String>,
    #[serde(default = "default_plan")]
    #[validate(length(min = 1, max = 40, message = "Plano inválido."))]
    pub subscription_plan: String,
}

/// Atualização parcial: só os campos presentes mudam.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTenantPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da loja não pode ficar vazio."))]
    pub name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub address: Option<String>,
    pub status: Option<TenantStatus>,
    pub modules_enabled: Option<Vec<String>>,
    #[validate(length(min = 1, max = 40, message = "Plano inválido."))]
    pub subscription_plan: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Normaliza a lista de módulos: sem espaços, sem vazios, sem repetidos, em ordem.
pub fn normalize_modules(modules: &[String]) -> Vec<String> {
    modules
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl Tenant {
    /// Aplica uma atualização parcial sobre a linha atual.
    pub fn apply(&mut self, changes: UpdateTenantPayload) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(business_type) = changes.business_type {
            self.business_type = business_type;
        }
        if let Some(address) = changes.address {
            self.address = Some(address);
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(modules) = changes.modules_enabled {
            self.modules_enabled = normalize_modules(&modules);
        }
        if let Some(plan) = changes.subscription_plan {
            self.subscription_plan = plan;
        }
        if let Some(expires_at) = changes.expires_at {
            self.expires_at = Some(expires_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(business_type: BusinessType) -> Tenant {
        Tenant {
            id: 1,
            name: "Loja Centro".into(),
            business_type,
            address: None,
            status: TenantStatus::Trial,
            subscription_plan: "basic".into(),
            modules_enabled: vec![],
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn food_beverage_config_uses_snake_case_mode() {
        let config = ClientConfig::for_tenant(&tenant(BusinessType::FoodBeverage));
        assert_eq!(config.mode, "food_beverage");
        assert_eq!(config.status, Some(TenantStatus::Trial));
        assert!(config.features.contains(&"kitchen_print".to_string()));
    }

    #[test]
    fn operator_config_has_management_features() {
        let config = ClientConfig::for_operator();
        assert_eq!(config.mode, "superadmin");
        assert!(config.features.contains(&"tenant_management".to_string()));
        assert!(config.theme.is_none());
    }

    #[test]
    fn modules_are_trimmed_deduplicated_and_sorted() {
        let modules = vec![" Kitchen ".to_string(), "inventory".into(), "".into(), "kitchen".into()];
        assert_eq!(normalize_modules(&modules), vec!["inventory", "kitchen"]);
    }

    #[test]
    fn partial_update_only_touches_present_fields() {
        let mut t = tenant(BusinessType::Retail);
        t.status = TenantStatus::Suspended;

        t.apply(UpdateTenantPayload {
            status: Some(TenantStatus::Active),
            modules_enabled: Some(vec!["pos".into(), "pos".into()]),
            ..Default::default()
        });

        assert_eq!(t.status, TenantStatus::Active);
        assert_eq!(t.name, "Loja Centro");
        assert_eq!(t.business_type, BusinessType::Retail);
        assert_eq!(t.modules_enabled, vec!["pos"]);
    }

    #[test]
    fn unknown_business_type_is_rejected_on_create() {
        let result = serde_json::from_value::<CreateTenantPayload>(serde_json::json!({
            "name": "Loja",
            "business_type": "casino",
            "admin_username": "dono",
            "admin_password": "segredo1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn create_payload_defaults_to_basic_plan() {
        let payload: CreateTenantPayload = serde_json::from_value(serde_json::json!({
            "name": "Café da Praça",
            "business_type": "food_beverage",
            "admin_username": "dono",
            "admin_password": "segredo1"
        }))
        .unwrap();
        assert_eq!(payload.subscription_plan, "basic");
        assert!(payload.modules_enabled.is_empty());
        assert!(payload.validate().is_ok());
    }
}
