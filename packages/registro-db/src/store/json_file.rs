use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::PatientStore;
use crate::error::DbError;
use crate::models::{Patient, PatientFields};
use crate::query;

/// Cadastro guardado em um único arquivo com um array JSON
///
/// Cada escrita lê o arquivo inteiro, aplica a mudança e grava um arquivo
/// temporário que depois é renomeado sobre o original. O mutex serializa
/// esses ciclos; leituras não precisam dele porque o rename é atômico.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Abre o cadastro, criando diretórios e um array vazio se necessário
    pub async fn init(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        let store = Self::new(path);

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        match fs::metadata(&store.path).await {
            Ok(_) => info!("Cadastro aberto: {}", store.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                store.write_all(&[]).await?;
                info!("Cadastro criado em {}", store.path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Patient>, DbError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_all(&self, patients: &[Patient]) -> Result<(), DbError> {
        let bytes = serde_json::to_vec_pretty(patients)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;
        debug!(count = patients.len(), "Cadastro gravado");
        Ok(())
    }
}

#[async_trait]
impl PatientStore for JsonFileStore {
    fn backend_tag(&self) -> &'static str {
        "json"
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Patient>, DbError> {
        let mut patients = self.read_all().await?;
        query::sort_patients(&mut patients);
        Ok(patients)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Patient, DbError> {
        self.read_all()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(DbError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str) -> Result<Vec<Patient>, DbError> {
        Ok(query::filter_and_sort(self.read_all().await?, term))
    }

    #[instrument(skip_all)]
    async fn create(&self, fields: PatientFields) -> Result<Patient, DbError> {
        let _guard = self.write_lock.lock().await;
        let mut patients = self.read_all().await?;

        let patient = Patient::new(fields);
        patients.push(patient.clone());
        self.write_all(&patients).await?;

        info!(id = %patient.id, "Paciente cadastrado");
        Ok(patient)
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, id: Uuid, fields: PatientFields) -> Result<Patient, DbError> {
        let _guard = self.write_lock.lock().await;
        let mut patients = self.read_all().await?;

        let patient = patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DbError::NotFound(id))?;
        patient.apply_update(fields);
        let updated = patient.clone();

        self.write_all(&patients).await?;
        info!(%id, "Paciente atualizado");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let _guard = self.write_lock.lock().await;
        let mut patients = self.read_all().await?;

        let before = patients.len();
        patients.retain(|p| p.id != id);
        if patients.len() == before {
            return Err(DbError::NotFound(id));
        }

        self.write_all(&patients).await?;
        info!(%id, "Paciente removido");
        Ok(())
    }
}
