// src/models/catalog.rs
//
// Visões mínimas dos diretórios externos (clientes, matérias-primas, produtos).
// O CRUD desses cadastros vive fora deste serviço.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
}

/// Matéria-prima ou produto acabado, só com o necessário para checar o dono.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockItemRef {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
}
