use anyhow::{Context, Result};
use registro_acs::config::AppConfig;
use registro_acs::routes::{self, AppState};
use registro_acs::{build_store, built_info, telemetry};
use tracing::info;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao aguardar sinal de encerramento: {e}");
    }
    info!("Sinal de encerramento recebido");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(config.log_format);

    info!(
        version = built_info::PKG_VERSION,
        rustc = built_info::RUSTC_VERSION,
        profile = built_info::PROFILE,
        "Iniciando {}",
        built_info::PKG_NAME
    );

    let store = build_store(&config).await?;
    let backend = store.backend_tag();
    let app = routes::app(AppState::new(store), &config);

    let addr = config.socket_addr();
    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("Falha ao escutar em {addr}"))?;

    info!(%addr, backend, "Servidor rodando");

    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Falha no servidor HTTP")?;

    info!("Servidor encerrado");
    Ok(())
}
