// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// As categorias de erro que um chamador pode observar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthenticated,
    AccessDenied,
    NotFound,
    InvalidOperation,
    Conflict,
    InternalError,
    ValidationError,
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Não autenticado: {0}")]
    Unauthenticated(String),

    #[error("Acesso negado: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Conflict(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn invalid_credentials() -> Self {
        AppError::Unauthenticated("Usuário ou senha inválidos.".into())
    }

    pub fn invalid_token() -> Self {
        AppError::Unauthenticated("Token de autenticação inválido, expirado ou ausente.".into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_) => ErrorKind::ValidationError,
            AppError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AppError::AccessDenied(_) => ErrorKind::AccessDenied,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidOperation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": kind,
                    "message": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            AppError::Unauthenticated(msg)
            | AppError::AccessDenied(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidOperation(msg)
            | AppError::Conflict(msg) => json!({ "error": kind, "message": msg }),

            // O detalhe dos erros internos vai só para o log, nunca para o cliente.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                json!({ "error": kind, "message": "Ocorreu um erro inesperado." })
            }
        };

        (status, Json(body)).into_response()
    }
}
