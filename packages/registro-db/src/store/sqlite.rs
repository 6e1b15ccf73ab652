use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{FromRow, Row};
use tracing::{info, instrument};
use uuid::Uuid;

use super::PatientStore;
use crate::error::DbError;
use crate::models::{Patient, PatientFields};
use crate::{init_db_pool, query, DbConfig};

/// Coleção de fichas no SQLite
///
/// Cada linha guarda o documento JSON completo do paciente; `name`, `cns`
/// e `micro_area` são cópias indexadas do documento.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Linha da tabela `patients` decodificada a partir do documento
struct StoredPatient(Patient);

impl FromRow<'_, SqliteRow> for StoredPatient {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let document: String = row.try_get("document")?;
        serde_json::from_str(&document)
            .map(StoredPatient)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: String::from("document"),
                source: Box::new(e),
            })
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Abre o pool, aplica as migrações e devolve o backend pronto
    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self::new(init_db_pool(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_all(&self) -> Result<Vec<Patient>, DbError> {
        let rows: Vec<StoredPatient> = sqlx::query_as("SELECT document FROM patients")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }
}

#[async_trait]
impl PatientStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Patient>, DbError> {
        let mut patients = self.fetch_all().await?;
        query::sort_patients(&mut patients);
        Ok(patients)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Patient, DbError> {
        let row: Option<StoredPatient> =
            sqlx::query_as("SELECT document FROM patients WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|row| row.0).ok_or(DbError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str) -> Result<Vec<Patient>, DbError> {
        // A comparação sem acentos não existe no SQLite; o filtro roda aqui
        Ok(query::filter_and_sort(self.fetch_all().await?, term))
    }

    #[instrument(skip_all)]
    async fn create(&self, fields: PatientFields) -> Result<Patient, DbError> {
        let patient = Patient::new(fields);
        let document = serde_json::to_string(&patient)?;

        sqlx::query(
            "INSERT INTO patients (id, name, cns, micro_area, created_at, updated_at, document) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(patient.id.to_string())
        .bind(&patient.fields.name)
        .bind(patient.fields.cns.as_deref())
        .bind(patient.micro_area())
        .bind(patient.created_at.to_rfc3339())
        .bind(patient.updated_at.to_rfc3339())
        .bind(document)
        .execute(&self.pool)
        .await?;

        info!(id = %patient.id, "Paciente cadastrado");
        Ok(patient)
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, id: Uuid, fields: PatientFields) -> Result<Patient, DbError> {
        let mut transaction = self.pool.begin().await?;

        let row: Option<StoredPatient> =
            sqlx::query_as("SELECT document FROM patients WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&mut *transaction)
                .await?;
        let mut patient = row.map(|row| row.0).ok_or(DbError::NotFound(id))?;

        patient.apply_update(fields);
        let document = serde_json::to_string(&patient)?;

        sqlx::query(
            "UPDATE patients SET name = ?, cns = ?, micro_area = ?, updated_at = ?, document = ? \
             WHERE id = ?",
        )
        .bind(&patient.fields.name)
        .bind(patient.fields.cns.as_deref())
        .bind(patient.micro_area())
        .bind(patient.updated_at.to_rfc3339())
        .bind(document)
        .bind(id.to_string())
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        info!(%id, "Paciente atualizado");
        Ok(patient)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(id));
        }

        info!(%id, "Paciente removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;
    use tempfile::{tempdir, TempDir};

    async fn store() -> (TempDir, SqliteStore) {
        let temp_dir = tempdir().unwrap();
        let config = DbConfig {
            db_path: temp_dir
                .path()
                .join("registro.db")
                .to_str()
                .unwrap()
                .to_string(),
            max_connections: 2,
        };
        let store = SqliteStore::connect(&config).await.unwrap();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn create_then_find() {
        let (_dir, store) = store().await;
        contract::create_then_find(&store).await;
    }

    #[tokio::test]
    async fn update_preserves_identity() {
        let (_dir, store) = store().await;
        contract::update_preserves_identity(&store).await;
    }

    #[tokio::test]
    async fn delete_removes_one() {
        let (_dir, store) = store().await;
        contract::delete_removes_one(&store).await;
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (_dir, store) = store().await;
        contract::missing_ids_are_not_found(&store).await;
    }

    #[tokio::test]
    async fn search_and_order() {
        let (_dir, store) = store().await;
        contract::search_and_order(&store).await;
    }

    #[tokio::test]
    async fn indexed_columns_follow_the_document() {
        let (_dir, store) = store().await;
        let created = store
            .create(contract::fields("Tereza", "05"))
            .await
            .unwrap();
        store
            .update(created.id, contract::fields("Tereza Cristina", "07"))
            .await
            .unwrap();

        let (name, micro_area): (String, Option<String>) =
            sqlx::query_as("SELECT name, micro_area FROM patients WHERE id = ?")
                .bind(created.id.to_string())
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(name, "Tereza Cristina");
        assert_eq!(micro_area.as_deref(), Some("07"));
    }

    #[tokio::test]
    async fn corrupt_document_is_a_query_error() {
        let (_dir, store) = store().await;
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO patients (id, name, created_at, updated_at, document) \
             VALUES (?, 'X', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z', '{oops')",
        )
        .bind(id.to_string())
        .execute(store.pool())
        .await
        .unwrap();

        let err = store.find_by_id(id).await.unwrap_err();
        assert!(matches!(err, DbError::QueryError(_)));
    }
}
