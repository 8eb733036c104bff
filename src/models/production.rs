// src/models/production.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::ledger::Unit;

// Só existe um estado: a produção é gravada já concluída.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "production_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Production {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub production_date: DateTime<Utc>,
    pub batch_code: Option<String>,
    pub notes: Option<String>,
    pub status: ProductionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductionMaterialLine {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub production_id: Uuid,
    pub line_number: i32,
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductionProductLine {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub production_id: Uuid,
    pub line_number: i32,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
}

/// Cabeçalho + itens, como devolvido pelas consultas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionDetail {
    #[serde(flatten)]
    pub header: Production,
    pub materials: Vec<ProductionMaterialLine>,
    pub products: Vec<ProductionProductLine>,
}

// --- Comandos de entrada ---

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionLine {
    pub stock_item_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduction {
    pub production_date: DateTime<Utc>,
    pub batch_code: Option<String>,
    pub notes: Option<String>,
    pub materials: Vec<ProductionLine>,
    pub products: Vec<ProductionLine>,
}
