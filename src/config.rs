// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{BalanceRepository, CatalogRepository, MovementRepository, ProductionRepository},
    services::{BalanceService, MovementService, ProductionService},
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte de chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {raw}"))?,
            None => 5,
        };

        let acquire_timeout_secs: u64 = match lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_ACQUIRE_TIMEOUT_SECS inválido: {raw}"))?,
            None => 3,
        };

        let bind_addr = lookup("APP_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            bind_addr,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub movement_service: MovementService,
    pub balance_service: BalanceService,
    pub production_service: ProductionService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool))
    }

    /// Monta o gráfico de dependências sobre uma pool já existente.
    pub fn from_pool(db_pool: PgPool) -> Self {
        let catalog = CatalogRepository::new();
        let balances = BalanceRepository::new();
        let movements = MovementRepository::new();

        let movement_service =
            MovementService::new(movements.clone(), balances.clone(), catalog);
        let balance_service =
            BalanceService::new(balances, movements, movement_service.clone());
        let production_service =
            ProductionService::new(ProductionRepository::new(), movement_service.clone());

        Self {
            db_pool,
            movement_service,
            balance_service,
            production_service,
        }
    }
}
