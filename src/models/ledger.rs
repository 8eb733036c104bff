// src/models/ledger.rs

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::error::AppError;

// --- 1. Tipo de item de estoque ---
// Define qual tabela de saldo/movimento e qual vocabulário de tipos se aplica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockItemKind {
    #[serde(rename = "raw-materials")]
    RawMaterial,
    #[serde(rename = "finished-products")]
    FinishedProduct,
}

impl StockItemKind {
    pub fn balance_table(self) -> &'static str {
        match self {
            StockItemKind::RawMaterial => "raw_material_balances",
            StockItemKind::FinishedProduct => "finished_product_balances",
        }
    }

    pub fn movement_table(self) -> &'static str {
        match self {
            StockItemKind::RawMaterial => "raw_material_movements",
            StockItemKind::FinishedProduct => "finished_product_movements",
        }
    }

    /// Tabela do catálogo externo (matérias-primas ou produtos).
    pub fn catalog_table(self) -> &'static str {
        match self {
            StockItemKind::RawMaterial => "raw_materials",
            StockItemKind::FinishedProduct => "products",
        }
    }
}

impl fmt::Display for StockItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockItemKind::RawMaterial => f.write_str("matéria-prima"),
            StockItemKind::FinishedProduct => f.write_str("produto acabado"),
        }
    }
}

// --- 2. Tipos de movimento ---
// O conjunto é fechado: um tipo fora do vocabulário do item é rejeitado em `polarity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_kind", rename_all = "snake_case")] // Banco
#[serde(rename_all = "snake_case")] // JSON
pub enum MovementKind {
    Purchase,         // Vira "purchase"
    Adjustment,       // Vira "adjustment"
    ProductionUsage,  // Vira "production_usage"
    InitialLoad,      // Vira "initial_load"
    ProductionOutput, // Vira "production_output"
    Sale,             // Vira "sale"
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Purchase => "purchase",
            MovementKind::Adjustment => "adjustment",
            MovementKind::ProductionUsage => "production_usage",
            MovementKind::InitialLoad => "initial_load",
            MovementKind::ProductionOutput => "production_output",
            MovementKind::Sale => "sale",
        }
    }

    /// Tabela estática (tipo de item, tipo de movimento) -> entrada/saída.
    ///
    /// `adjustment` é sempre classificado como entrada; o sinal real vem da
    /// própria quantidade informada (ver [`signed_delta`]).
    pub fn polarity(self, item_kind: StockItemKind) -> Result<Polarity, AppError> {
        use MovementKind::*;
        use StockItemKind::*;

        match (item_kind, self) {
            (_, Adjustment) | (_, InitialLoad) => Ok(Polarity::Entry),
            (RawMaterial, Purchase) => Ok(Polarity::Entry),
            (RawMaterial, ProductionUsage) => Ok(Polarity::Exit),
            (FinishedProduct, ProductionOutput) => Ok(Polarity::Entry),
            (FinishedProduct, Sale) => Ok(Polarity::Exit),
            (item_kind, kind) => Err(AppError::InvalidKind { item_kind, kind }),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Entry,
    Exit,
}

// --- 3. Unidades de medida ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unit_of_measure", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Litros,
    Kg,
    Gramos,
    Unidades,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Unit::Litros => "litros",
            Unit::Kg => "kg",
            Unit::Gramos => "gramos",
            Unit::Unidades => "unidades",
        };
        f.write_str(symbol)
    }
}

// ---
// Planejador de movimentos (regras puras, sem banco)
// ---

/// Casas decimais das colunas de quantidade (`NUMERIC(18, 4)`).
pub const QUANTITY_SCALE: u32 = 4;

// NUMERIC(18, 4) guarda valores absolutos menores que 10^14
fn quantity_limit() -> Decimal {
    Decimal::from(100_000_000_000_000i64)
}

/// Recusa quantidades que o banco arredondaria ou não comportaria.
/// Assim o valor calculado aqui é exatamente o valor gravado.
pub fn check_storable(quantity: Decimal) -> Result<(), AppError> {
    if quantity.normalize().scale() > QUANTITY_SCALE {
        return Err(AppError::InvalidQuantity(format!(
            "A quantidade aceita no máximo {QUANTITY_SCALE} casas decimais."
        )));
    }
    if quantity.abs() >= quantity_limit() {
        return Err(AppError::InvalidQuantity(
            "A quantidade excede o limite suportado.".into(),
        ));
    }
    Ok(())
}

/// Calcula o delta com sinal que será gravado no livro-razão.
///
/// Regras:
/// 1. O tipo precisa pertencer ao vocabulário do item.
/// 2. Quantidade zero nunca é aceita.
/// 3. No máximo [`QUANTITY_SCALE`] casas decimais, dentro do limite da coluna.
/// 4. Fora de `adjustment`, a quantidade solicitada precisa ser positiva.
/// 5. `adjustment` repassa o valor com sinal; os demais aplicam a polaridade.
pub fn signed_delta(
    item_kind: StockItemKind,
    kind: MovementKind,
    requested: Decimal,
) -> Result<Decimal, AppError> {
    let polarity = kind.polarity(item_kind)?;

    if requested.is_zero() {
        return Err(AppError::InvalidQuantity(
            "A quantidade não pode ser zero.".into(),
        ));
    }

    check_storable(requested)?;

    if kind != MovementKind::Adjustment && requested <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity(format!(
            "A quantidade deve ser maior que zero para movimentos do tipo '{kind}'."
        )));
    }

    let delta = match (kind, polarity) {
        (MovementKind::Adjustment, _) => requested,
        (_, Polarity::Entry) => requested,
        (_, Polarity::Exit) => -requested,
    };

    Ok(delta)
}

/// Um movimento já validado contra as regras puras, pronto para ser aplicado.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementPlan {
    pub item_kind: StockItemKind,
    pub kind: MovementKind,
    pub requested: Decimal,
    pub delta: Decimal,
    pub unit: Unit,
}

impl MovementPlan {
    pub fn new(
        item_kind: StockItemKind,
        kind: MovementKind,
        requested: Decimal,
        unit: Unit,
    ) -> Result<Self, AppError> {
        let delta = signed_delta(item_kind, kind, requested)?;
        Ok(Self {
            item_kind,
            kind,
            requested,
            delta,
            unit,
        })
    }

    /// Novo saldo absoluto; falha se ele ficar negativo ou sair do limite da coluna.
    pub fn next_quantity(
        &self,
        stock_item_id: uuid::Uuid,
        current: Decimal,
    ) -> Result<Decimal, AppError> {
        let next = current.checked_add(self.delta).ok_or_else(|| {
            AppError::InvalidQuantity("O saldo resultante excede o limite suportado.".into())
        })?;
        if next < Decimal::ZERO {
            return Err(AppError::InsufficientStock {
                stock_item_id,
                current,
                requested: self.requested,
                unit: self.unit,
            });
        }
        if next >= quantity_limit() {
            return Err(AppError::InvalidQuantity(
                "O saldo resultante excede o limite suportado.".into(),
            ));
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn raw_material_vocabulary() {
        let item = StockItemKind::RawMaterial;
        assert_eq!(MovementKind::Purchase.polarity(item).unwrap(), Polarity::Entry);
        assert_eq!(MovementKind::InitialLoad.polarity(item).unwrap(), Polarity::Entry);
        assert_eq!(MovementKind::Adjustment.polarity(item).unwrap(), Polarity::Entry);
        assert_eq!(MovementKind::ProductionUsage.polarity(item).unwrap(), Polarity::Exit);
        assert!(matches!(
            MovementKind::Sale.polarity(item),
            Err(AppError::InvalidKind { .. })
        ));
        assert!(matches!(
            MovementKind::ProductionOutput.polarity(item),
            Err(AppError::InvalidKind { .. })
        ));
    }

    #[test]
    fn finished_product_vocabulary() {
        let item = StockItemKind::FinishedProduct;
        assert_eq!(MovementKind::ProductionOutput.polarity(item).unwrap(), Polarity::Entry);
        assert_eq!(MovementKind::InitialLoad.polarity(item).unwrap(), Polarity::Entry);
        assert_eq!(MovementKind::Adjustment.polarity(item).unwrap(), Polarity::Entry);
        assert_eq!(MovementKind::Sale.polarity(item).unwrap(), Polarity::Exit);
        assert!(matches!(
            MovementKind::Purchase.polarity(item),
            Err(AppError::InvalidKind { .. })
        ));
        assert!(matches!(
            MovementKind::ProductionUsage.polarity(item),
            Err(AppError::InvalidKind { .. })
        ));
    }

    #[test]
    fn exits_are_stored_negative() {
        let delta = signed_delta(
            StockItemKind::RawMaterial,
            MovementKind::ProductionUsage,
            dec("30"),
        )
        .unwrap();
        assert_eq!(delta, dec("-30"));

        let delta = signed_delta(StockItemKind::FinishedProduct, MovementKind::Sale, dec("2.5"))
            .unwrap();
        assert_eq!(delta, dec("-2.5"));
    }

    #[test]
    fn adjustment_passes_sign_through() {
        let item = StockItemKind::FinishedProduct;
        assert_eq!(
            signed_delta(item, MovementKind::Adjustment, dec("-3")).unwrap(),
            dec("-3")
        );
        assert_eq!(
            signed_delta(item, MovementKind::Adjustment, dec("4")).unwrap(),
            dec("4")
        );
    }

    #[test]
    fn zero_is_always_rejected() {
        for kind in [MovementKind::Adjustment, MovementKind::Purchase] {
            let err = signed_delta(StockItemKind::RawMaterial, kind, Decimal::ZERO).unwrap_err();
            assert!(matches!(err, AppError::InvalidQuantity(_)), "{kind}");
        }
    }

    #[test]
    fn negative_non_adjustment_is_rejected() {
        let err = signed_delta(StockItemKind::RawMaterial, MovementKind::Purchase, dec("-1"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
    }

    #[test]
    fn quantities_finer_than_four_places_are_rejected() {
        for raw in ["0.00005", "0.00004", "1.23456"] {
            let err = signed_delta(StockItemKind::RawMaterial, MovementKind::Purchase, dec(raw))
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidQuantity(_)), "{raw}");
        }

        let err = signed_delta(StockItemKind::FinishedProduct, MovementKind::Adjustment, dec("-0.00001"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        let delta = signed_delta(StockItemKind::RawMaterial, MovementKind::Purchase, dec("1.50000"))
            .unwrap();
        assert_eq!(delta, dec("1.5"));
        assert!(signed_delta(StockItemKind::RawMaterial, MovementKind::Purchase, dec("0.0001")).is_ok());
    }

    #[test]
    fn quantities_beyond_the_column_range_are_rejected() {
        let err = signed_delta(
            StockItemKind::RawMaterial,
            MovementKind::Purchase,
            dec("100000000000000"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
        assert!(check_storable(dec("99999999999999.9999")).is_ok());
    }

    #[test]
    fn overflowing_balance_is_an_error_not_a_panic() {
        let item = Uuid::new_v4();
        let purchase = MovementPlan::new(
            StockItemKind::RawMaterial,
            MovementKind::Purchase,
            dec("1"),
            Unit::Kg,
        )
        .unwrap();

        assert!(matches!(
            purchase.next_quantity(item, Decimal::MAX),
            Err(AppError::InvalidQuantity(_))
        ));
        assert!(matches!(
            purchase.next_quantity(item, dec("99999999999999.9999")),
            Err(AppError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn kind_is_checked_before_quantity() {
        let err =
            signed_delta(StockItemKind::RawMaterial, MovementKind::Sale, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AppError::InvalidKind { .. }));
    }

    #[test]
    fn scenario_purchase_then_usage() {
        let item = Uuid::new_v4();
        let purchase =
            MovementPlan::new(StockItemKind::RawMaterial, MovementKind::Purchase, dec("100"), Unit::Kg)
                .unwrap();
        let after_purchase = purchase.next_quantity(item, Decimal::ZERO).unwrap();
        assert_eq!(after_purchase, dec("100"));

        let usage = MovementPlan::new(
            StockItemKind::RawMaterial,
            MovementKind::ProductionUsage,
            dec("30"),
            Unit::Kg,
        )
        .unwrap();
        assert_eq!(usage.next_quantity(item, after_purchase).unwrap(), dec("70"));
    }

    #[test]
    fn insufficiency_reports_current_and_requested() {
        let item = Uuid::new_v4();
        let usage = MovementPlan::new(
            StockItemKind::RawMaterial,
            MovementKind::ProductionUsage,
            dec("100"),
            Unit::Kg,
        )
        .unwrap();

        match usage.next_quantity(item, dec("70")) {
            Err(AppError::InsufficientStock {
                stock_item_id,
                current,
                requested,
                unit,
            }) => {
                assert_eq!(stock_item_id, item);
                assert_eq!(current, dec("70"));
                assert_eq!(requested, dec("100"));
                assert_eq!(unit, Unit::Kg);
            }
            other => panic!("esperava InsufficientStock, veio {other:?}"),
        }
    }

    #[test]
    fn negative_adjustment_cannot_overdraw() {
        let item = Uuid::new_v4();
        let shrink = MovementPlan::new(
            StockItemKind::FinishedProduct,
            MovementKind::Adjustment,
            dec("-3"),
            Unit::Kg,
        )
        .unwrap();
        assert_eq!(shrink.next_quantity(item, dec("10")).unwrap(), dec("7"));
        assert!(shrink.next_quantity(item, dec("2")).is_err());
        // Zerar exatamente é permitido.
        assert_eq!(shrink.next_quantity(item, dec("3")).unwrap(), Decimal::ZERO);
    }

    fn any_raw_kind() -> impl Strategy<Value = MovementKind> {
        prop_oneof![
            Just(MovementKind::Purchase),
            Just(MovementKind::Adjustment),
            Just(MovementKind::ProductionUsage),
            Just(MovementKind::InitialLoad),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Para qualquer sequência de movimentos, o saldo projetado é a soma dos
        /// deltas aceitos e nunca fica negativo; movimentos rejeitados não alteram nada.
        #[test]
        fn projected_balance_is_sum_of_accepted_deltas(
            ops in prop::collection::vec((any_raw_kind(), -500i64..500i64), 1..40)
        ) {
            let item = Uuid::new_v4();
            let mut balance = Decimal::ZERO;
            let mut ledger: Vec<Decimal> = Vec::new();

            for (kind, raw_qty) in ops {
                let requested = Decimal::new(raw_qty, 1);
                let plan = match MovementPlan::new(StockItemKind::RawMaterial, kind, requested, Unit::Kg) {
                    Ok(plan) => plan,
                    Err(_) => continue,
                };

                match plan.next_quantity(item, balance) {
                    Ok(next) => {
                        prop_assert_ne!(plan.delta, Decimal::ZERO);
                        ledger.push(plan.delta);
                        balance = next;
                    }
                    Err(AppError::InsufficientStock { current, .. }) => {
                        prop_assert_eq!(current, balance);
                    }
                    Err(other) => prop_assert!(false, "erro inesperado: {other:?}"),
                }

                prop_assert!(balance >= Decimal::ZERO);
                prop_assert_eq!(balance, ledger.iter().copied().sum::<Decimal>());
            }
        }
    }
}
