// src/services/movement_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BalanceRepository, CatalogRepository, MovementRepository},
    models::{
        inventory::{Balance, Movement, MovementFilter, NewMovement},
        ledger::{MovementPlan, StockItemKind},
    },
};

#[derive(Clone)]
pub struct MovementService {
    movements: MovementRepository,
    balances: BalanceRepository,
    catalog: CatalogRepository,
}

impl MovementService {
    pub fn new(
        movements: MovementRepository,
        balances: BalanceRepository,
        catalog: CatalogRepository,
    ) -> Self {
        Self {
            movements,
            balances,
            catalog,
        }
    }

    // --- REGISTRAR MOVIMENTO (avulso, transação própria) ---
    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        request: &NewMovement,
    ) -> Result<Movement, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // 1. Regras puras primeiro: nada de banco se o pedido já é inválido
        let plan = MovementPlan::new(item_kind, request.kind, request.quantity, request.unit)?;

        let mut tx = executor.begin().await?;

        // 2. O tenant precisa existir
        self.ensure_tenant(&mut *tx, tenant_id).await?;

        // 3. Movimento + saldo na mesma transação
        let (movement, balance) = self
            .apply_movement(
                &mut *tx,
                tenant_id,
                request.stock_item_id,
                &plan,
                request.reference_id,
                request.notes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            stock_item_id = %movement.stock_item_id,
            kind = %movement.kind,
            delta = %movement.quantity,
            balance = %balance.quantity,
            "movimento registrado"
        );

        Ok(movement)
    }

    /// Núcleo do motor de movimentos. Roda sobre a transação de quem chama
    /// (movimento avulso ou produção) e nunca faz commit por conta própria.
    pub(crate) async fn apply_movement(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        stock_item_id: Uuid,
        plan: &MovementPlan,
        reference_id: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<(Movement, Balance), AppError> {
        let item_kind = plan.item_kind;

        // 1. O item precisa existir e pertencer ao tenant
        self.ensure_stock_item(&mut *conn, item_kind, tenant_id, stock_item_id)
            .await?;

        // 2. Trava o saldo (criando a linha zerada se for o primeiro movimento)
        self.balances
            .ensure_row(&mut *conn, item_kind, tenant_id, stock_item_id, plan.unit)
            .await?;
        let current = self
            .balances
            .lock_for_update(&mut *conn, item_kind, tenant_id, stock_item_id)
            .await?
            .map(|b| b.quantity)
            .unwrap_or(Decimal::ZERO);

        // 3. Suficiência
        let next = match plan.next_quantity(stock_item_id, current) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    stock_item_id = %stock_item_id,
                    current = %current,
                    requested = %plan.requested,
                    "movimento rejeitado por saldo insuficiente"
                );
                return Err(err);
            }
        };

        // 4. Livro-razão (delta com sinal) e projeção
        let movement = self
            .movements
            .insert(
                &mut *conn,
                item_kind,
                tenant_id,
                stock_item_id,
                plan.kind,
                plan.delta,
                plan.unit,
                reference_id,
                notes,
            )
            .await?;

        let balance = self
            .balances
            .upsert(&mut *conn, item_kind, tenant_id, stock_item_id, next, plan.unit)
            .await?;

        Ok((movement, balance))
    }

    // --- LEITURAS ---

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        filter: MovementFilter,
    ) -> Result<Vec<Movement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.movements
            .list(executor, item_kind, tenant_id, filter)
            .await
    }

    pub async fn get_movement<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        movement_id: Uuid,
    ) -> Result<Movement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = self
            .movements
            .find_by_id(executor, item_kind, movement_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Movimento {movement_id} não encontrado."))
            })?;

        if movement.tenant_id != tenant_id {
            return Err(AppError::Forbidden(
                "Acesso a este movimento não é permitido.".into(),
            ));
        }

        Ok(movement)
    }

    /// Soma de todos os deltas do par no livro-razão.
    pub async fn ledger_total<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.movements
            .sum_for_item(executor, item_kind, tenant_id, stock_item_id)
            .await
    }

    // ---
    // Verificações de dono (diretórios externos)
    // ---

    pub(crate) async fn ensure_tenant(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<(), AppError> {
        self.catalog
            .find_tenant(&mut *conn, tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cliente {tenant_id} não encontrado.")))?;
        Ok(())
    }

    pub(crate) async fn ensure_stock_item(
        &self,
        conn: &mut PgConnection,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Uuid,
    ) -> Result<(), AppError> {
        let item = self
            .catalog
            .find_stock_item(&mut *conn, item_kind, stock_item_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{item_kind} {stock_item_id} não encontrado(a)."))
            })?;

        if item.tenant_id != tenant_id {
            return Err(AppError::Forbidden(format!(
                "{item_kind} {stock_item_id} pertence a outro cliente."
            )));
        }

        Ok(())
    }
}
