// src/db/production_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::production::{
        Production, ProductionLine, ProductionMaterialLine, ProductionProductLine,
        ProductionStatus,
    },
};

const PRODUCTION_COLUMNS: &str =
    "id, tenant_id, production_date, batch_code, notes, status, created_at";

#[derive(Clone, Default)]
pub struct ProductionRepository;

impl ProductionRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    /// O id vem de fora: os movimentos da produção já o usam como referência.
    pub async fn insert_header<'e, E>(
        &self,
        executor: E,
        production_id: Uuid,
        tenant_id: Uuid,
        production_date: DateTime<Utc>,
        batch_code: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Production, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO productions (id, tenant_id, production_date, batch_code, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCTION_COLUMNS}
            "#
        );

        let production = sqlx::query_as::<_, Production>(&sql)
            .bind(production_id)
            .bind(tenant_id)
            .bind(production_date)
            .bind(batch_code)
            .bind(notes)
            .bind(ProductionStatus::Completed)
            .fetch_one(executor)
            .await?;

        Ok(production)
    }

    /// Grava todos os itens de matéria-prima de uma vez, na ordem recebida.
    pub async fn insert_material_lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        production_id: Uuid,
        lines: &[ProductionLine],
    ) -> Result<Vec<ProductionMaterialLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO production_materials \
             (tenant_id, production_id, line_number, raw_material_id, quantity, unit) ",
        );
        builder.push_values(lines.iter().enumerate(), |mut row, (index, line)| {
            row.push_bind(tenant_id)
                .push_bind(production_id)
                .push_bind(index as i32)
                .push_bind(line.stock_item_id)
                .push_bind(line.quantity)
                .push_bind(line.unit);
        });
        builder.push(
            " RETURNING id, tenant_id, production_id, line_number, raw_material_id, quantity, unit",
        );

        let rows = builder
            .build_query_as::<ProductionMaterialLine>()
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn insert_product_lines<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        production_id: Uuid,
        lines: &[ProductionLine],
    ) -> Result<Vec<ProductionProductLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO production_products \
             (tenant_id, production_id, line_number, product_id, quantity, unit) ",
        );
        builder.push_values(lines.iter().enumerate(), |mut row, (index, line)| {
            row.push_bind(tenant_id)
                .push_bind(production_id)
                .push_bind(index as i32)
                .push_bind(line.stock_item_id)
                .push_bind(line.quantity)
                .push_bind(line.unit);
        });
        builder.push(
            " RETURNING id, tenant_id, production_id, line_number, product_id, quantity, unit",
        );

        let rows = builder
            .build_query_as::<ProductionProductLine>()
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list_headers<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Production>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {PRODUCTION_COLUMNS} FROM productions
            WHERE tenant_id = $1
            ORDER BY production_date DESC, created_at DESC
            "#
        );

        let productions = sqlx::query_as::<_, Production>(&sql)
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(productions)
    }

    pub async fn find_header<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        production_id: Uuid,
    ) -> Result<Option<Production>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PRODUCTION_COLUMNS} FROM productions WHERE id = $1 AND tenant_id = $2"
        );

        let production = sqlx::query_as::<_, Production>(&sql)
            .bind(production_id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(production)
    }

    pub async fn material_lines_for<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        production_ids: &[Uuid],
    ) -> Result<Vec<ProductionMaterialLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, ProductionMaterialLine>(
            r#"
            SELECT id, tenant_id, production_id, line_number, raw_material_id, quantity, unit
            FROM production_materials
            WHERE tenant_id = $1 AND production_id = ANY($2)
            ORDER BY production_id, line_number
            "#,
        )
        .bind(tenant_id)
        .bind(production_ids)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn product_lines_for<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        production_ids: &[Uuid],
    ) -> Result<Vec<ProductionProductLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, ProductionProductLine>(
            r#"
            SELECT id, tenant_id, production_id, line_number, product_id, quantity, unit
            FROM production_products
            WHERE tenant_id = $1 AND production_id = ANY($2)
            ORDER BY production_id, line_number
            "#,
        )
        .bind(tenant_id)
        .bind(production_ids)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }
}
