use crate::model::ModelDefinition;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

#[derive(Serialize, Deserialize, Default)]
struct CatalogFile {
    models: Vec<ModelDefinition>,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error reading catalog: {0}")]
    Confy(#[from] confy::ConfyError),
    #[error("Model {0} already exists")]
    DuplicateId(String),
    #[error("Model {0} not found")]
    NotFound(String),
}

pub struct CatalogRepository {
    path: PathBuf,
    models: RwLock<Vec<ModelDefinition>>,
    write_lock: Mutex<()>,
}

impl CatalogRepository {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match Self::load_or_create(path) {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                error!("Failed to load catalog: {}", err);
                None
            }
        }
    }

    fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();

        let file: CatalogFile = if path.exists() {
            confy::load_path(path)?
        } else {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = CatalogFile::default();
            confy::store_path(path, &file)?;
            file
        };

        Ok(Self {
            path: path.to_path_buf(),
            models: RwLock::new(file.models),
            write_lock: Mutex::new(()),
        })
    }

    pub async fn list(&self) -> Vec<ModelDefinition> {
        self.models.read().await.clone()
    }

    pub async fn get(&self, model_id: &str) -> Option<ModelDefinition> {
        self.models
            .read()
            .await
            .iter()
            .find(|model| model.id == model_id)
            .cloned()
    }

    pub async fn add(&self, definition: ModelDefinition) -> Result<(), CatalogError> {
        let _guard = self.write_lock.lock().await;

        let mut updated = self.models.read().await.clone();
        if updated.iter().any(|model| model.id == definition.id) {
            return Err(CatalogError::DuplicateId(definition.id.clone()));
        }
        let model_id = definition.id.clone();
        updated.push(definition);

        // The file is rewritten before memory so a failed write leaves
        // readers on the previous state.
        self.persist(&updated).await?;
        *self.models.write().await = updated;
        info!("Registered model: {}", model_id);
        Ok(())
    }

    pub async fn delete(&self, model_id: &str) -> Result<ModelDefinition, CatalogError> {
        let _guard = self.write_lock.lock().await;

        let mut updated = self.models.read().await.clone();
        let position = updated
            .iter()
            .position(|model| model.id == model_id)
            .ok_or_else(|| CatalogError::NotFound(model_id.to_string()))?;
        let removed = updated.remove(position);

        self.persist(&updated).await?;
        *self.models.write().await = updated;
        info!("Deleted model: {}", model_id);
        Ok(removed)
    }

    /// The YAML rewrite is synchronous file I/O, so it runs on the blocking
    /// pool; the caller still holds the write lock across persist+commit.
    async fn persist(&self, models: &[ModelDefinition]) -> Result<(), CatalogError> {
        let path = self.path.clone();
        let file = CatalogFile {
            models: models.to_vec(),
        };
        tokio::task::spawn_blocking(move || confy::store_path(path, &file))
            .await
            .map_err(|err| CatalogError::Io(std::io::Error::other(err)))??;
        Ok(())
    }
}
