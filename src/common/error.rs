use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ledger::{MovementKind, StockItemKind, Unit};

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidQuantity(String),

    #[error("Tipo de movimento '{kind}' não é permitido para {item_kind}")]
    InvalidKind {
        item_kind: StockItemKind,
        kind: MovementKind,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error(
        "Estoque insuficiente para o item {stock_item_id}. Atual: {current} {unit}, solicitado: {requested} {unit}"
    )]
    InsufficientStock {
        stock_item_id: Uuid,
        current: Decimal,
        requested: Decimal,
        unit: Unit,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidTenantHeader(&'static str),

    // Variante para erros de banco de dados que não têm tradução de domínio
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Código estável que o cliente HTTP pode usar para distinguir os casos.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::InvalidKind { .. } => "INVALID_KIND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidTenantHeader(_) => "INVALID_TENANT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidQuantity(_)
            | AppError::InvalidKind { .. }
            | AppError::InvalidInput(_)
            | AppError::InvalidTenantHeader(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Traduz violações de constraint para erros de domínio em vez de vazar o código do Postgres.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return AppError::Conflict(format!("Registro duplicado ({constraint})."));
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Conflict(format!(
                    "Operação viola a integridade referencial ({constraint})."
                ));
            }
            if db_err.is_check_violation() {
                return AppError::InvalidInput(format!("Valor rejeitado pela regra {constraint}."));
            }
        }
        AppError::DatabaseError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
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
                    "error": "Um ou mais campos são inválidos.",
                    "code": code,
                    "details": details,
                })
            }
            AppError::InsufficientStock {
                stock_item_id,
                current,
                requested,
                unit,
            } => json!({
                "error": self.to_string(),
                "code": code,
                "stockItemId": stock_item_id,
                "current": current,
                "requested": requested,
                "unit": unit,
            }),
            // Erros internos: o detalhe vai para o log, nunca para o cliente.
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {}", self);
                json!({ "error": "Ocorreu um erro inesperado.", "code": code })
            }
            _ => json!({ "error": self.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}
