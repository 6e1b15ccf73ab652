//! Definições de erro para a biblioteca registro-db
//!
//! Todos os backends do cadastro reportam falhas com [`DbError`]; cabe à
//! camada web decidir como degradar.

use thiserror::Error;
use uuid::Uuid;

/// Erros específicos para operações de armazenamento de pacientes
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Erro de conexão com banco de dados: {0}")]
    ConnectionError(String),

    #[error("Erro de migração: {0}")]
    MigrationError(String),

    #[error("Erro de consulta: {0}")]
    QueryError(String),

    #[error("Paciente não encontrado: {0}")]
    NotFound(Uuid),

    #[error("Violação de restrição: {0}")]
    ConstraintViolation(String),

    #[error("Erro de armazenamento: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Registro corrompido: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erro interno: {0}")]
    InternalError(String),
}

impl DbError {
    /// Indica se o erro representa um paciente inexistente
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

/// Conversão de erros específicos do SQLx para nossos tipos de erro
///
/// `RowNotFound` não tem um id associado; os backends tratam esse caso
/// antes da conversão e o mapeiam para [`DbError::NotFound`].
impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(dbe) => {
                if let Some(code) = dbe.code() {
                    if code.as_ref() == "1555" || code.as_ref() == "2067" {
                        return DbError::ConstraintViolation(dbe.message().to_string());
                    }
                }
                DbError::QueryError(dbe.message().to_string())
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::QueryError(format!("Coluna não encontrada: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::QueryError(format!("Erro ao decodificar coluna {}: {}", index, source))
            }
            sqlx::Error::Io(io_err) => DbError::ConnectionError(io_err.to_string()),
            sqlx::Error::Configuration(conf_err) => DbError::ConnectionError(conf_err.to_string()),
            sqlx::Error::PoolClosed => {
                DbError::ConnectionError("Pool de conexões fechado".to_string())
            }
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionError("Timeout no pool de conexões".to_string())
            }
            sqlx::Error::WorkerCrashed => {
                DbError::InternalError("Worker do banco de dados falhou".to_string())
            }
            _ => DbError::InternalError(format!("Erro inesperado: {:?}", error)),
        }
    }
}
