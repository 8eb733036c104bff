// src/db/movement_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        inventory::{Movement, MovementFilter},
        ledger::{MovementKind, StockItemKind, Unit},
    },
};

const MOVEMENT_COLUMNS: &str =
    "id, tenant_id, stock_item_id, kind, quantity, unit, reference_id, notes, created_at";

#[derive(Clone, Default)]
pub struct MovementRepository;

impl MovementRepository {
    pub fn new() -> Self {
        Self
    }

    /// Registra uma movimentação no livro-razão. `quantity` já vem com sinal.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
        kind: MovementKind,
        quantity: Decimal,
        unit: Unit,
        reference_id: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<Movement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} (tenant_id, stock_item_id, kind, quantity, unit, reference_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MOVEMENT_COLUMNS}
            "#,
            item_kind.movement_table()
        );

        let movement = sqlx::query_as::<_, Movement>(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .bind(kind)
            .bind(quantity)
            .bind(unit)
            .bind(reference_id)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(movement)
    }

    /// Histórico do tenant, mais recentes primeiro.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        filter: MovementFilter,
    ) -> Result<Vec<Movement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM {}
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR stock_item_id = $2)
              AND ($3::movement_kind IS NULL OR kind = $3)
            ORDER BY created_at DESC, id
            "#,
            item_kind.movement_table()
        );

        let movements = sqlx::query_as::<_, Movement>(&sql)
            .bind(tenant_id)
            .bind(filter.stock_item_id)
            .bind(filter.kind)
            .fetch_all(executor)
            .await?;

        Ok(movements)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        movement_id: Uuid,
    ) -> Result<Option<Movement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM {} WHERE id = $1",
            item_kind.movement_table()
        );

        let movement = sqlx::query_as::<_, Movement>(&sql)
            .bind(movement_id)
            .fetch_optional(executor)
            .await?;

        Ok(movement)
    }

    /// Soma dos deltas gravados para o par; usada para conferir a projeção.
    pub async fn sum_for_item<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(quantity), 0) FROM {}
            WHERE tenant_id = $1 AND stock_item_id = $2
            "#,
            item_kind.movement_table()
        );

        let total: Decimal = sqlx::query_scalar(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .fetch_one(executor)
            .await?;

        Ok(total)
    }
}
