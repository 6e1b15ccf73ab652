//! Registro ACS - cadastro de pacientes para Agentes Comunitários de Saúde
//!
//! Aplicação web que lista, busca, cadastra, edita e remove fichas de
//! pacientes com marcadores de saúde. O armazenamento vem de `registro-db`
//! e é injetado nas rotas como `Arc<dyn PatientStore>`.

use std::sync::Arc;

use anyhow::{Context, Result};
use registro_db::{JsonFileStore, PatientStore, SqliteStore};

pub mod config;
pub mod error;
pub mod forms;
pub mod routes;
pub mod telemetry;
pub mod views;

use config::{AppConfig, Backend};

/// Informações geradas em tempo de build
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Abre o backend escolhido na configuração
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn PatientStore>> {
    let store: Arc<dyn PatientStore> = match config.backend {
        Backend::Json => Arc::new(
            JsonFileStore::init(&config.json_path)
                .await
                .with_context(|| format!("Falha ao abrir {}", config.json_path.display()))?,
        ),
        Backend::Sqlite => Arc::new(
            SqliteStore::connect(&config.db)
                .await
                .context("Falha ao abrir o banco SQLite")?,
        ),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn builds_the_configured_backend() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig {
            json_path: dir.path().join("banco.json"),
            ..AppConfig::default()
        };
        config.db.db_path = dir.path().join("registro.db").to_str().unwrap().to_string();

        let store = build_store(&config).await.unwrap();
        assert_eq!(store.backend_tag(), "json");
        assert!(config.json_path.exists());

        config.backend = Backend::Sqlite;
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.backend_tag(), "sqlite");
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
