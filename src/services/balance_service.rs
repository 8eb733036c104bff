// src/services/balance_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BalanceRepository, MovementRepository},
    models::{
        inventory::{Balance, NewBalance},
        ledger::{check_storable, MovementKind, StockItemKind, Unit},
    },
    services::movement_service::MovementService,
};

#[derive(Clone)]
pub struct BalanceService {
    balances: BalanceRepository,
    movements: MovementRepository,
    movement_service: MovementService,
}

impl BalanceService {
    pub fn new(
        balances: BalanceRepository,
        movements: MovementRepository,
        movement_service: MovementService,
    ) -> Self {
        Self {
            balances,
            movements,
            movement_service,
        }
    }

    // ---
    // Acessores da projeção
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
        self.balances
            .find_by_tenant_and_stock_item(executor, item_kind, tenant_id, stock_item_id)
            .await
    }

    /// Substitui a quantidade inteira (não é incremento).
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
        if quantity < Decimal::ZERO {
            return Err(AppError::InvalidQuantity(
                "O saldo não pode ser negativo.".into(),
            ));
        }
        check_storable(quantity)?;

        self.balances
            .upsert(executor, item_kind, tenant_id, stock_item_id, quantity, unit)
            .await
    }

    pub async fn list_balances<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        stock_item_id: Option<Uuid>,
    ) -> Result<Vec<Balance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.balances
            .list(executor, item_kind, tenant_id, stock_item_id)
            .await
    }

    pub async fn get_balance<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        balance_id: Uuid,
    ) -> Result<Balance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = self
            .balances
            .find_by_id(executor, item_kind, balance_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saldo {balance_id} não encontrado.")))?;

        if balance.tenant_id != tenant_id {
            return Err(AppError::Forbidden(
                "Acesso a este saldo não é permitido.".into(),
            ));
        }

        Ok(balance)
    }

    // --- CRIAÇÃO DIRETA (raramente usada) ---
    // Normalmente o saldo nasce com o primeiro movimento.
    pub async fn create_balance<'e, E>(
        &self,
        executor: E,
        item_kind: StockItemKind,
        tenant_id: Uuid,
        request: &NewBalance,
    ) -> Result<Balance, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if request.quantity < Decimal::ZERO {
            return Err(AppError::InvalidQuantity(
                "O saldo inicial não pode ser negativo.".into(),
            ));
        }
        check_storable(request.quantity)?;

        let mut tx = executor.begin().await?;

        // 1. Cliente e item válidos
        self.movement_service
            .ensure_tenant(&mut *tx, tenant_id)
            .await?;
        self.movement_service
            .ensure_stock_item(&mut *tx, item_kind, tenant_id, request.stock_item_id)
            .await?;

        // 2. Não pode haver projeção duplicada
        let existing = self
            .balances
            .find_by_tenant_and_stock_item(&mut *tx, item_kind, tenant_id, request.stock_item_id)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "Já existe saldo para este item. Use movimentos para alterar a quantidade.".into(),
            ));
        }

        let balance = self
            .balances
            .insert(
                &mut *tx,
                item_kind,
                tenant_id,
                request.stock_item_id,
                request.quantity,
                request.unit,
            )
            .await?;

        // 3. Carga inicial no livro-razão, para a soma dos movimentos continuar batendo
        if request.quantity > Decimal::ZERO {
            self.movements
                .insert(
                    &mut *tx,
                    item_kind,
                    tenant_id,
                    request.stock_item_id,
                    MovementKind::InitialLoad,
                    request.quantity,
                    request.unit,
                    None,
                    Some("Saldo criado diretamente"),
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            stock_item_id = %request.stock_item_id,
            quantity = %request.quantity,
            "saldo criado diretamente"
        );

        Ok(balance)
    }
}
