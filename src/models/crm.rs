// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Clientes e fornecedores: entidades de referência, só pertencem ao tenant.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Supplier {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos editáveis de um cliente.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CustomerFields {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Campos editáveis de um fornecedor.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SupplierFields {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}
