//! Registro DB - Biblioteca de acesso ao cadastro de pacientes do ACS
//!
//! Esta biblioteca fornece:
//! - Modelo da ficha do paciente com marcadores de saúde
//! - Interface única de armazenamento ([`store::PatientStore`]) com backends
//!   em arquivo JSON e em SQLite
//! - Regras de busca e ordenação compartilhadas pelos backends
//! - Migrações automáticas do banco de dados SQLite

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub mod error;
pub mod migrations;
pub mod models;
pub mod query;
pub mod store;

pub use error::DbError;
pub use models::{Address, HealthMarkers, Patient, PatientFields, SocialProfile};
pub use store::{JsonFileStore, PatientStore, SqliteStore};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockPatientStore;

/// Configuração da conexão com o banco de dados
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Caminho para o arquivo SQLite
    pub db_path: String,
    /// Número máximo de conexões no pool
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_path: "data/registro.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Inicializa o pool de conexões SQLite e aplica as migrações
pub async fn init_db_pool(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = Path::new(&config.db_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .context("Falha ao criar diretório para banco de dados")?;
        }
    }

    let connection_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .pragma("synchronous", "NORMAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connection_options)
        .await
        .context("Falha ao conectar ao banco de dados SQLite")?;

    migrations::run_migrations(&pool)
        .await
        .context("Falha ao aplicar migrações")?;

    info!("Banco de dados inicializado com sucesso: {}", config.db_path);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_db_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("test.db");

        let config = DbConfig {
            db_path: db_path.to_str().unwrap().to_string(),
            max_connections: 2,
        };

        let pool = init_db_pool(&config).await?;

        let result: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await?;

        assert_eq!(result.0, 1);
        assert!(db_path.exists());

        Ok(())
    }
}
