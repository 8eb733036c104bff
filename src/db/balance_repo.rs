// src/db/balance_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        inventory::Balance,
        ledger::{StockItemKind, Unit},
    },
};

const BALANCE_COLUMNS: &str = "id, tenant_id, stock_item_id, quantity, unit, updated_at";

#[derive(Clone, Default)]
pub struct BalanceRepository;

impl BalanceRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Funções de "Leitura"
    // ---

    pub async fn find_by_tenant_and_stock_item<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
    ) -> Result<Option<Balance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM {} WHERE tenant_id = $1 AND stock_item_id = $2",
            item_kind.balance_table()
        );

        let balance = sqlx::query_as::<_, Balance>(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .fetch_optional(executor)
            .await?;
        Ok(balance)
    }

    /// Busca por id sem filtro de tenant; quem chama decide entre 404 e 403.
    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        balance_id: Uuid,
    ) -> Result<Option<Balance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM {} WHERE id = $1",
            item_kind.balance_table()
        );

        let balance = sqlx::query_as::<_, Balance>(&sql)
            .bind(balance_id)
            .fetch_optional(executor)
            .await?;
        Ok(balance)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Option<Uuid>,
    ) -> Result<Vec<Balance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {BALANCE_COLUMNS} FROM {}
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR stock_item_id = $2)
            ORDER BY updated_at DESC, id
            "#,
            item_kind.balance_table()
        );

        let balances = sqlx::query_as::<_, Balance>(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .fetch_all(executor)
            .await?;
        Ok(balances)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Garante que a linha de saldo exista (quantidade 0) para que o `FOR UPDATE`
    /// seguinte sempre tenha o que travar, inclusive no primeiro movimento do par.
    /// Se a transação for desfeita, a linha some junto.
    pub async fn ensure_row<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
        unit: Unit,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} (tenant_id, stock_item_id, quantity, unit)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (tenant_id, stock_item_id) DO NOTHING
            "#,
            item_kind.balance_table()
        );

        sqlx::query(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .bind(unit)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Lê o saldo travando a linha até o fim da transação.
    pub async fn lock_for_update<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
    ) -> Result<Option<Balance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {BALANCE_COLUMNS} FROM {}
            WHERE tenant_id = $1 AND stock_item_id = $2
            FOR UPDATE
            "#,
            item_kind.balance_table()
        );

        let balance = sqlx::query_as::<_, Balance>(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .fetch_optional(executor)
            .await?;
        Ok(balance)
    }

    /// "UPSERT" com substituição total da quantidade: quem chama já calculou o novo valor absoluto.
    /// A unidade segue a do último movimento.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
        quantity: Decimal,
        unit: Unit,
    ) -> Result<Balance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} (tenant_id, stock_item_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, stock_item_id)
            DO UPDATE SET
                quantity = EXCLUDED.quantity,
                unit = EXCLUDED.unit,
                updated_at = NOW()
            RETURNING {BALANCE_COLUMNS}
            "#,
            item_kind.balance_table()
        );

        let balance = sqlx::query_as::<_, Balance>(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .bind(quantity)
            .bind(unit)
            .fetch_one(executor)
            .await?;
        Ok(balance)
    }

    /// Inserção pura (criação direta). Par já existente vira `Conflict`.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
        quantity: Decimal,
        unit: Unit,
    ) -> Result<Balance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {} (tenant_id, stock_item_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING {BALANCE_COLUMNS}
            "#,
            item_kind.balance_table()
        );

        sqlx::query_as::<_, Balance>(&sql)
            .bind(tenant_id)
            .bind(stock_item_id)
            .bind(quantity)
            .bind(unit)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::Conflict(
                            "Já existe saldo para este item. Use movimentos para alterar a quantidade."
                                .into(),
                        );
                    }
                }
                e.into()
            })
    }
}
