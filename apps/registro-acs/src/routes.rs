//! Rotas HTTP do cadastro
//!
//! | rota                 | ação                                   |
//! |----------------------|----------------------------------------|
//! | `GET /`              | lista, com `?search=` opcional         |
//! | `GET /cadastro`      | formulário vazio                       |
//! | `POST /cadastro`     | cria e volta para a lista              |
//! | `GET /paciente/:id`  | ficha                                  |
//! | `GET /editar/:id`    | formulário preenchido                  |
//! | `POST /editar/:id`   | atualiza e volta para a ficha          |
//! | `POST /delete/:id`   | remove e volta para a lista            |
//! | `GET /health`        | estado do serviço em JSON              |

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use registro_db::PatientStore;
use serde::{Deserialize, Serialize};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;
use validator::ValidationErrors;

use crate::built_info;
use crate::config::AppConfig;
use crate::error::{parse_id, AppError};
use crate::forms::{self, PatientForm};
use crate::views::{self, FormTarget};

/// Estado compartilhado pelas rotas
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PatientStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }
}

/// Rotas do cadastro, sem camadas de infraestrutura
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/cadastro", get(new_form).post(create))
        .route("/paciente/:id", get(details))
        .route("/editar/:id", get(edit_form).post(update))
        .route("/delete/:id", post(delete))
        .route("/health", get(health))
        .with_state(state)
}

/// Aplicação completa: rotas, arquivos estáticos e camadas HTTP
pub fn app(state: AppState, config: &AppConfig) -> Router {
    router(state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

async fn index(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Html<String> {
    let term = query.search.unwrap_or_default();

    let result = if term.trim().is_empty() {
        state.store.list_all().await
    } else {
        state.store.search(&term).await
    };

    let patients = result.unwrap_or_else(|err| {
        warn!(error = %err, "Falha ao carregar pacientes; exibindo lista vazia");
        Vec::new()
    });

    views::index(&patients, &term)
}

async fn new_form() -> Html<String> {
    views::patient_form(FormTarget::Create, &PatientForm::default(), &[])
}

fn invalid_form(target: FormTarget, form: &PatientForm, errors: &ValidationErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        views::patient_form(target, form, &forms::error_messages(errors)),
    )
        .into_response()
}

async fn create(
    State(state): State<AppState>,
    Form(form): Form<PatientForm>,
) -> Result<Response, AppError> {
    match form.clone().into_fields() {
        Ok(fields) => {
            state.store.create(fields).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => Ok(invalid_form(FormTarget::Create, &form, &errors)),
    }
}

async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let patient = state.store.find_by_id(parse_id(&id)?).await?;
    Ok(views::details(&patient))
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let patient = state.store.find_by_id(parse_id(&id)?).await?;
    Ok(views::patient_form(
        FormTarget::Edit(patient.id),
        &PatientForm::from_patient(&patient),
        &[],
    ))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PatientForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    match form.clone().into_fields() {
        Ok(fields) => {
            state.store.update(id, fields).await?;
            Ok(Redirect::to(&format!("/paciente/{id}")).into_response())
        }
        Err(errors) => Ok(invalid_form(FormTarget::Edit(id), &form, &errors)),
    }
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.store.delete(parse_id(&id)?).await?;
    Ok(Redirect::to("/"))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub version: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.store.backend_tag(),
        version: built_info::PKG_VERSION,
    })
}
