// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::ledger::{MovementKind, Unit};

// --- Movimentação (livro-razão, somente inserção) ---
// `quantity` já carrega o sinal: positivo = entrada, negativo = saída.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub stock_item_id: Uuid,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub unit: Unit,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Saldo (projeção do livro-razão) ---
// Existe exatamente uma linha por (tenant, item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
    pub updated_at: DateTime<Utc>,
}

/// Filtros opcionais do histórico de movimentos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    pub stock_item_id: Option<Uuid>,
    pub kind: Option<MovementKind>,
}

/// Pedido de movimento avulso (não vinculado a uma produção).
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub stock_item_id: Uuid,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub unit: Unit,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Criação direta de saldo (caminho raro; o normal é o primeiro movimento criá-lo).
#[derive(Debug, Clone, PartialEq)]
pub struct NewBalance {
    pub stock_item_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
}
