// src/handlers/productions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::{
        ledger::Unit,
        production::{NewProduction, ProductionLine},
    },
};

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("A quantidade deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductionLinePayload {
    pub stock_item_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,

    pub unit: Unit,
}

impl From<ProductionLinePayload> for ProductionLine {
    fn from(line: ProductionLinePayload) -> Self {
        Self {
            stock_item_id: line.stock_item_id,
            quantity: line.quantity,
            unit: line.unit,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionPayload {
    // Sem data, vale o momento do registro
    pub production_date: Option<DateTime<Utc>>,

    #[validate(length(max = 100, message = "O código de lote aceita no máximo 100 caracteres."))]
    pub batch_code: Option<String>,

    #[validate(length(max = 1000, message = "As observações aceitam no máximo 1000 caracteres."))]
    pub notes: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub materials: Vec<ProductionLinePayload>,

    #[validate(
        length(min = 1, message = "A produção precisa gerar ao menos um produto."),
        nested
    )]
    #[serde(default)]
    pub products: Vec<ProductionLinePayload>,
}

impl From<CreateProductionPayload> for NewProduction {
    fn from(payload: CreateProductionPayload) -> Self {
        Self {
            production_date: payload.production_date.unwrap_or_else(Utc::now),
            batch_code: payload.batch_code,
            notes: payload.notes,
            materials: payload.materials.into_iter().map(Into::into).collect(),
            products: payload.products.into_iter().map(Into::into).collect(),
        }
    }
}

// ---
// Handler: create_production
// ---
pub async fn create_production(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Json(payload): Json<CreateProductionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let command = NewProduction::from(payload);

    let production = app_state
        .production_service
        .create_production(&app_state.db_pool, tenant_id, &command)
        .await?;

    Ok((StatusCode::CREATED, Json(production)))
}

// ---
// Handler: list_productions
// ---
pub async fn list_productions(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    let productions = app_state
        .production_service
        .list_productions(&mut conn, tenant_id)
        .await?;

    Ok((StatusCode::OK, Json(productions)))
}

// ---
// Handler: get_production
// ---
pub async fn get_production(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(production_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    let production = app_state
        .production_service
        .get_production(&mut conn, tenant_id, production_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Produção {production_id} não encontrada.")))?;

    Ok((StatusCode::OK, Json(production)))
}
