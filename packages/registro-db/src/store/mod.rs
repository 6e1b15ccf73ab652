//! Armazenamento do cadastro de pacientes
//!
//! A camada web recebe um `Arc<dyn PatientStore>` e não sabe qual backend
//! está por trás: arquivo JSON ([`JsonFileStore`]) ou coleção de documentos
//! no SQLite ([`SqliteStore`]).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Patient, PatientFields};

mod json_file;
mod sqlite;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

/// Operações sobre o cadastro
///
/// Listagens e buscas sempre voltam na ordem canônica de
/// [`crate::query::compare_patients`].
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Nome curto do backend, usado em logs e no health check
    fn backend_tag(&self) -> &'static str;

    async fn list_all(&self) -> Result<Vec<Patient>, DbError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Patient, DbError>;

    /// Busca por trecho do nome, CNS, CPF ou ficha familiar.
    /// Termo em branco equivale a `list_all`.
    async fn search(&self, term: &str) -> Result<Vec<Patient>, DbError>;

    async fn create(&self, fields: PatientFields) -> Result<Patient, DbError>;

    /// Substitui os campos editáveis, preservando `id` e `created_at`
    async fn update(&self, id: Uuid, fields: PatientFields) -> Result<Patient, DbError>;

    async fn delete(&self, id: Uuid) -> Result<(), DbError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Propriedades que todo backend precisa cumprir

    use super::*;
    use crate::models::{Address, HealthMarkers};

    pub fn fields(name: &str, micro_area: &str) -> PatientFields {
        PatientFields {
            name: name.to_string(),
            cns: Some("700 0012 3456 7890".to_string()),
            mother_name: Some("Joana".to_string()),
            address: Address {
                street: "Rua do Sol".to_string(),
                number: Some("42".to_string()),
                micro_area: Some(micro_area.to_string()),
                ..Default::default()
            },
            markers: HealthMarkers {
                diabetic: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub async fn create_then_find(store: &dyn PatientStore) {
        let input = fields("Antônia Ferreira", "01");
        let created = store.create(input.clone()).await.unwrap();
        let found = store.find_by_id(created.id).await.unwrap();

        assert_eq!(found.fields, input);
        assert_eq!(found.id, created.id);
        assert_eq!(found.created_at, created.created_at);
    }

    pub async fn update_preserves_identity(store: &dyn PatientStore) {
        let created = store.create(fields("Pedro", "02")).await.unwrap();

        let mut changed = fields("Pedro Henrique", "04");
        changed.markers.bedridden = true;
        let updated = store.update(created.id, changed.clone()).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);

        let found = store.find_by_id(created.id).await.unwrap();
        assert_eq!(found.fields, changed);
        assert_eq!(found.created_at, created.created_at);
        assert!(found.updated_at >= found.created_at);
    }

    pub async fn delete_removes_one(store: &dyn PatientStore) {
        let keep = store.create(fields("Lúcia", "01")).await.unwrap();
        let gone = store.create(fields("Rita", "01")).await.unwrap();
        let before = store.list_all().await.unwrap().len();

        store.delete(gone.id).await.unwrap();

        let after = store.list_all().await.unwrap();
        assert_eq!(after.len(), before - 1);
        assert!(after.iter().any(|p| p.id == keep.id));
        assert!(store.find_by_id(gone.id).await.unwrap_err().is_not_found());
    }

    pub async fn missing_ids_are_not_found(store: &dyn PatientStore) {
        let id = Uuid::new_v4();
        assert!(store.find_by_id(id).await.unwrap_err().is_not_found());
        assert!(store
            .update(id, fields("Ninguém", "01"))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.delete(id).await.unwrap_err().is_not_found());
    }

    pub async fn search_and_order(store: &dyn PatientStore) {
        store.create(fields("zélia", "10")).await.unwrap();
        store.create(fields("Benedito", "2")).await.unwrap();
        store.create(fields("ana", "2")).await.unwrap();

        let all = store.list_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(Patient::name).collect();
        assert_eq!(names, vec!["ana", "Benedito", "zélia"]);

        let found = store.search("ZELI").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "zélia");

        assert_eq!(store.search("  ").await.unwrap(), all);
    }
}
