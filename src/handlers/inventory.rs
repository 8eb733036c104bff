// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::{
        inventory::{MovementFilter, NewBalance, NewMovement},
        ledger::{MovementKind, StockItemKind, Unit},
    },
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_zero(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_zero() {
        let mut err = ValidationError::new("not_zero");
        err.message = Some("A quantidade não pode ser zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: RecordMovement
// ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordMovementPayload {
    #[validate(required(message = "O campo 'stockItemId' é obrigatório."))]
    pub stock_item_id: Option<Uuid>,

    pub kind: MovementKind,

    // O sinal só é aceito em ajustes; o resto da regra fica no planejador
    #[validate(custom(function = "validate_not_zero"))]
    pub quantity: Decimal,

    pub unit: Unit,

    pub reference_id: Option<Uuid>,

    #[validate(length(max = 1000, message = "As observações aceitam no máximo 1000 caracteres."))]
    pub notes: Option<String>,
}

impl RecordMovementPayload {
    fn into_command(self) -> Result<NewMovement, AppError> {
        let stock_item_id = self
            .stock_item_id
            .ok_or_else(|| AppError::InvalidInput("stockItemId ausente.".into()))?;

        Ok(NewMovement {
            stock_item_id,
            kind: self.kind,
            quantity: self.quantity,
            unit: self.unit,
            reference_id: self.reference_id,
            notes: self.notes,
        })
    }
}

// ---
// Handler: record_movement
// ---
pub async fn record_movement(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(item_kind): Path<StockItemKind>,
    Json(payload): Json<RecordMovementPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let command = payload.into_command()?;

    let movement = app_state
        .movement_service
        .record_movement(&app_state.db_pool, item_kind, tenant_id, &command)
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

// ---
// Handler: list_movements
// ---
pub async fn list_movements(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(item_kind): Path<StockItemKind>,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, AppError> {
    let movements = app_state
        .movement_service
        .list_movements(&app_state.db_pool, item_kind, tenant_id, filter)
        .await?;

    Ok((StatusCode::OK, Json(movements)))
}

// ---
// Handler: get_movement
// ---
pub async fn get_movement(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path((item_kind, movement_id)): Path<(StockItemKind, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let movement = app_state
        .movement_service
        .get_movement(&app_state.db_pool, item_kind, tenant_id, movement_id)
        .await?;

    Ok((StatusCode::OK, Json(movement)))
}

// ---
// Saldos
// ---
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pub stock_item_id: Option<Uuid>,
}

pub async fn list_balances(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(item_kind): Path<StockItemKind>,
    Query(query): Query<BalanceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let balances = app_state
        .balance_service
        .list_balances(&app_state.db_pool, item_kind, tenant_id, query.stock_item_id)
        .await?;

    Ok((StatusCode::OK, Json(balances)))
}

pub async fn get_balance(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path((item_kind, balance_id)): Path<(StockItemKind, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let balance = app_state
        .balance_service
        .get_balance(&app_state.db_pool, item_kind, tenant_id, balance_id)
        .await?;

    Ok((StatusCode::OK, Json(balance)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBalancePayload {
    #[validate(required(message = "O campo 'stockItemId' é obrigatório."))]
    pub stock_item_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub quantity: Decimal,

    pub unit: Unit,
}

pub async fn create_balance(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(item_kind): Path<StockItemKind>,
    Json(payload): Json<CreateBalancePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let stock_item_id = payload
        .stock_item_id
        .ok_or_else(|| AppError::InvalidInput("stockItemId ausente.".into()))?;

    let balance = app_state
        .balance_service
        .create_balance(
            &app_state.db_pool,
            item_kind,
            tenant_id,
            &NewBalance {
                stock_item_id,
                quantity: payload.quantity,
                unit: payload.unit,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(balance)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_adjustment_passes_payload_validation() {
        let payload: RecordMovementPayload = serde_json::from_value(serde_json::json!({
            "stockItemId": Uuid::new_v4(),
            "kind": "adjustment",
            "quantity": -3,
            "unit": "kg"
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
    }

    #[test]
    fn missing_stock_item_is_a_validation_error() {
        let payload: RecordMovementPayload = serde_json::from_value(serde_json::json!({
            "kind": "purchase",
            "quantity": 3,
            "unit": "kg"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("stock_item_id"));
    }

    #[test]
    fn negative_initial_balance_is_rejected() {
        let payload: CreateBalancePayload = serde_json::from_value(serde_json::json!({
            "stockItemId": Uuid::new_v4(),
            "quantity": -1,
            "unit": "litros"
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
