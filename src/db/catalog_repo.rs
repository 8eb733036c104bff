// src/db/catalog_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{StockItemRef, Tenant},
        ledger::StockItemKind,
    },
};

// Leitura dos diretórios externos. Só consulta: o CRUD desses cadastros é de outro módulo.
#[derive(Clone, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT id, name FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;
        Ok(tenant)
    }

    /// Busca o item sem filtrar por tenant, para distinguir "não existe" de "é de outro tenant".
    pub async fn find_stock_item<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        stock_item_id: Uuid,
    ) -> Result<Option<StockItemRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT id, tenant_id, name FROM {} WHERE id = $1",
            item_kind.catalog_table()
        );

        let item = sqlx::query_as::<_, StockItemRef>(&sql)
            .bind(stock_item_id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }
}
