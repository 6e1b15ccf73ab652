//! Erros das rotas e sua tradução para respostas HTTP

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use registro_db::DbError;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Paciente não encontrado: {0}")]
    NotFound(Uuid),

    #[error("Identificador inválido: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Store(DbError),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => AppError::NotFound(id),
            other => AppError::Store(other),
        }
    }
}

/// Converte o segmento de rota em id de paciente
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(raw.to_string()))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(_) | AppError::InvalidId(_) => {
                debug!(error = %self, "Redirecionando para a lista");
                Redirect::to("/").into_response()
            }
            AppError::Store(err) => {
                error!(error = %err, "Falha no armazenamento");
                (StatusCode::INTERNAL_SERVER_ERROR, views::error_page()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn not_found_redirects_to_listing() {
        let response = AppError::from(DbError::NotFound(Uuid::new_v4())).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
    }

    #[test]
    fn malformed_id_redirects_to_listing() {
        let err = parse_id("123abc").unwrap_err();
        assert!(matches!(err, AppError::InvalidId(_)));
        assert_eq!(err.into_response().status(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn storage_failure_is_a_500() {
        let err: AppError = DbError::ConnectionError("disco cheio".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
