//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use manufacturing_backend::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG tem prioridade; sem ele, sqlx fica só nos avisos
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new(&config)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = manufacturing_backend::app(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao instalar o handler de Ctrl+C: {}", err);
        // Sem sinal, o servidor segue até ser morto
        std::future::pending::<()>().await;
    }
    tracing::info!("Encerrando o servidor...");
}
