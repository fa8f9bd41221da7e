use crate::model::{ContainerState, ContainerStatus, ModelDefinition};
use crate::repositories::catalog_repository::{CatalogError, CatalogRepository};
use crate::repositories::docker_repository::DockerRepository;
use bollard::errors::Error as DockerError;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Model {0} not found")]
    ModelNotFound(String),
    #[error("No container found for model {0}")]
    ContainerNotFound(String),
    #[error("error: {0}")]
    StartFailed(String),
    #[error("Error from Docker: {0}")]
    Docker(#[from] DockerError),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
}

/// One mutex per model id, so lifecycle transitions for the same model
/// serialize across their whole find-then-act sequence while different
/// models proceed in parallel.
struct ModelLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ModelLocks {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, model_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(model_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub struct LifecycleManager {
    catalog: Arc<CatalogRepository>,
    docker: Arc<DockerRepository>,
    locks: ModelLocks,
}

impl LifecycleManager {
    pub fn new(catalog: Arc<CatalogRepository>, docker: Arc<DockerRepository>) -> Self {
        Self {
            catalog,
            docker,
            locks: ModelLocks::new(),
        }
    }

    pub async fn run_model(&self, model_id: &str) -> Result<ContainerStatus, LifecycleError> {
        let _guard = self.locks.acquire(model_id).await;
        let definition = self
            .catalog
            .get(model_id)
            .await
            .ok_or_else(|| LifecycleError::ModelNotFound(model_id.to_string()))?;

        let status = self.docker.start(&definition).await;
        if let ContainerState::Error(message) = &status.status {
            return Err(LifecycleError::StartFailed(message.clone()));
        }
        info!("Model {} is {}", model_id, status.status);
        Ok(status)
    }

    pub async fn stop_model(&self, model_id: &str) -> Result<ContainerStatus, LifecycleError> {
        let _guard = self.locks.acquire(model_id).await;
        let status = self.docker.stop(model_id).await?;
        if status.status == ContainerState::NotFound {
            return Err(LifecycleError::ContainerNotFound(model_id.to_string()));
        }
        Ok(status)
    }

    /// Container teardown runs first and is best-effort: engine and catalog
    /// are independent sources of truth, so a failed or pointless removal
    /// must not block the catalog delete.
    pub async fn delete_model(&self, model_id: &str) -> Result<ModelDefinition, LifecycleError> {
        let _guard = self.locks.acquire(model_id).await;
        if let Err(err) = self.docker.remove(model_id).await {
            warn!("Failed to remove container for {}: {}", model_id, err);
        }
        Ok(self.catalog.delete(model_id).await?)
    }

    pub async fn status(&self) -> Result<Vec<ContainerStatus>, LifecycleError> {
        Ok(self.docker.list_managed().await?)
    }
}
