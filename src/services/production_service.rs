// src/services/production_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductionRepository,
    models::{
        ledger::{MovementKind, MovementPlan, StockItemKind},
        production::{
            NewProduction, Production, ProductionDetail, ProductionLine,
            ProductionMaterialLine, ProductionProductLine,
        },
    },
    services::movement_service::MovementService,
};

const MAX_BATCH_CODE_LEN: usize = 100;
const MAX_NOTES_LEN: usize = 1000;

#[derive(Clone)]
pub struct ProductionService {
    repo: ProductionRepository,
    movement_service: MovementService,
}

impl ProductionService {
    pub fn new(repo: ProductionRepository, movement_service: MovementService) -> Self {
        Self {
            repo,
            movement_service,
        }
    }

    /// Valida o pedido e monta os planos de movimento, sem tocar no banco.
    /// Retorna (consumos de matéria-prima, saídas de produto), na ordem recebida.
    pub fn plan(
        request: &NewProduction,
    ) -> Result<(Vec<MovementPlan>, Vec<MovementPlan>), AppError> {
        if request.products.is_empty() {
            return Err(AppError::InvalidInput(
                "A produção precisa gerar ao menos um produto.".into(),
            ));
        }

        if let Some(batch) = &request.batch_code {
            if batch.chars().count() > MAX_BATCH_CODE_LEN {
                return Err(AppError::InvalidInput(format!(
                    "O código de lote aceita no máximo {MAX_BATCH_CODE_LEN} caracteres."
                )));
            }
        }

        if let Some(notes) = &request.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(AppError::InvalidInput(format!(
                    "As observações aceitam no máximo {MAX_NOTES_LEN} caracteres."
                )));
            }
        }

        let line_plan = |item_kind: StockItemKind,
                         kind: MovementKind,
                         line: &ProductionLine|
         -> Result<MovementPlan, AppError> {
            if line.quantity <= Decimal::ZERO {
                return Err(AppError::InvalidQuantity(format!(
                    "A quantidade do item {} deve ser maior que zero.",
                    line.stock_item_id
                )));
            }
            MovementPlan::new(item_kind, kind, line.quantity, line.unit)
        };

        let materials = request
            .materials
            .iter()
            .map(|line| line_plan(StockItemKind::RawMaterial, MovementKind::ProductionUsage, line))
            .collect::<Result<Vec<_>, _>>()?;

        let products = request
            .products
            .iter()
            .map(|line| {
                line_plan(StockItemKind::FinishedProduct, MovementKind::ProductionOutput, line)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((materials, products))
    }

    // --- CRIAR PRODUÇÃO (tudo ou nada) ---
    pub async fn create_production<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        request: &NewProduction,
    ) -> Result<Production, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Pedido inválido não chega a abrir transação
        let (material_plans, product_plans) = Self::plan(request)?;

        let production_id = Uuid::new_v4();
        let mut tx = executor.begin().await?;

        self.movement_service
            .ensure_tenant(&mut *tx, tenant_id)
            .await?;

        // 1. Matérias-primas antes dos produtos: uma falta aborta antes de tocar em produto acabado
        let usage_note = Self::movement_note("Consumo em produção", request.batch_code.as_deref());
        self.apply_lines(
            &mut *tx,
            tenant_id,
            production_id,
            &request.materials,
            &material_plans,
            &usage_note,
        )
        .await?;

        // 2. Produtos acabados
        let output_note = Self::movement_note("Saída de produção", request.batch_code.as_deref());
        self.apply_lines(
            &mut *tx,
            tenant_id,
            production_id,
            &request.products,
            &product_plans,
            &output_note,
        )
        .await?;

        // 3. Cabeçalho
        let production = self
            .repo
            .insert_header(
                &mut *tx,
                production_id,
                tenant_id,
                request.production_date,
                request.batch_code.as_deref(),
                request.notes.as_deref(),
            )
            .await?;

        // 4. Itens
        self.repo
            .insert_material_lines(&mut *tx, tenant_id, production_id, &request.materials)
            .await?;
        self.repo
            .insert_product_lines(&mut *tx, tenant_id, production_id, &request.products)
            .await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            production_id = %production.id,
            materials = request.materials.len(),
            products = request.products.len(),
            "produção registrada"
        );

        Ok(production)
    }

    async fn apply_lines(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        production_id: Uuid,
        lines: &[ProductionLine],
        plans: &[MovementPlan],
        note: &str,
    ) -> Result<(), AppError> {
        for (line, plan) in lines.iter().zip(plans) {
            self.movement_service
                .apply_movement(
                    &mut *conn,
                    tenant_id,
                    line.stock_item_id,
                    plan,
                    Some(production_id),
                    Some(note),
                )
                .await?;
        }
        Ok(())
    }

    fn movement_note(prefix: &str, batch_code: Option<&str>) -> String {
        match batch_code {
            Some(batch) => format!("{prefix} (Lote: {batch})"),
            None => prefix.to_string(),
        }
    }

    // --- LEITURAS ---

    pub async fn list_productions(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductionDetail>, AppError> {
        let headers = self.repo.list_headers(&mut *conn, tenant_id).await?;
        self.attach_lines(conn, tenant_id, headers).await
    }

    /// `None` quando a produção não existe para este tenant.
    pub async fn get_production(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        production_id: Uuid,
    ) -> Result<Option<ProductionDetail>, AppError> {
        let Some(header) = self
            .repo
            .find_header(&mut *conn, tenant_id, production_id)
            .await?
        else {
            return Ok(None);
        };

        let mut details = self.attach_lines(conn, tenant_id, vec![header]).await?;
        Ok(details.pop())
    }

    async fn attach_lines(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        headers: Vec<Production>,
    ) -> Result<Vec<ProductionDetail>, AppError> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = headers.iter().map(|p| p.id).collect();

        let mut materials: HashMap<Uuid, Vec<ProductionMaterialLine>> = HashMap::new();
        for line in self
            .repo
            .material_lines_for(&mut *conn, tenant_id, &ids)
            .await?
        {
            materials.entry(line.production_id).or_default().push(line);
        }

        let mut products: HashMap<Uuid, Vec<ProductionProductLine>> = HashMap::new();
        for line in self
            .repo
            .product_lines_for(&mut *conn, tenant_id, &ids)
            .await?
        {
            products.entry(line.production_id).or_default().push(line);
        }

        let details = headers
            .into_iter()
            .map(|header| ProductionDetail {
                materials: materials.remove(&header.id).unwrap_or_default(),
                products: products.remove(&header.id).unwrap_or_default(),
                header,
            })
            .collect();

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::Unit;
    use chrono::Utc;

    fn line(quantity: i64, unit: Unit) -> ProductionLine {
        ProductionLine {
            stock_item_id: Uuid::new_v4(),
            quantity: Decimal::from(quantity),
            unit,
        }
    }

    fn request(materials: Vec<ProductionLine>, products: Vec<ProductionLine>) -> NewProduction {
        NewProduction {
            production_date: Utc::now(),
            batch_code: Some("B1".into()),
            notes: None,
            materials,
            products,
        }
    }

    #[test]
    fn production_without_products_is_rejected() {
        let err = ProductionService::plan(&request(vec![line(10, Unit::Kg)], vec![])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn materials_are_optional() {
        let (materials, products) =
            ProductionService::plan(&request(vec![], vec![line(5, Unit::Unidades)])).unwrap();
        assert!(materials.is_empty());
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn plans_consume_materials_and_emit_products() {
        let (materials, products) = ProductionService::plan(&request(
            vec![line(10, Unit::Kg), line(2, Unit::Litros)],
            vec![line(5, Unit::Unidades)],
        ))
        .unwrap();

        assert_eq!(materials.len(), 2);
        assert!(materials.iter().all(|p| p.kind == MovementKind::ProductionUsage));
        assert_eq!(materials[0].delta, Decimal::from(-10));
        assert_eq!(materials[1].delta, Decimal::from(-2));

        assert_eq!(products[0].kind, MovementKind::ProductionOutput);
        assert_eq!(products[0].item_kind, StockItemKind::FinishedProduct);
        assert_eq!(products[0].delta, Decimal::from(5));
    }

    #[test]
    fn non_positive_line_quantity_is_rejected() {
        let err = ProductionService::plan(&request(
            vec![line(0, Unit::Kg)],
            vec![line(5, Unit::Unidades)],
        ))
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));

        let err =
            ProductionService::plan(&request(vec![], vec![line(-1, Unit::Unidades)])).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
    }

    #[test]
    fn line_quantity_finer_than_the_column_is_rejected() {
        let mut req = request(vec![line(10, Unit::Kg)], vec![line(5, Unit::Unidades)]);
        req.materials[0].quantity = Decimal::new(100_005, 5); // 1.00005
        assert!(matches!(
            ProductionService::plan(&req),
            Err(AppError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn batch_code_length_is_limited() {
        let mut req = request(vec![], vec![line(1, Unit::Unidades)]);
        req.batch_code = Some("L".repeat(MAX_BATCH_CODE_LEN + 1));
        assert!(matches!(
            ProductionService::plan(&req),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn movement_note_names_the_batch() {
        assert_eq!(
            ProductionService::movement_note("Consumo em produção", Some("B1")),
            "Consumo em produção (Lote: B1)"
        );
        assert_eq!(
            ProductionService::movement_note("Saída de produção", None),
            "Saída de produção"
        );
    }
}
