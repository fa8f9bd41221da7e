use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::docker_repository::DockerRepository;
use crate::services::inference_proxy::InferenceProxy;
use crate::services::lifecycle_manager::LifecycleManager;
use std::sync::Arc;

/// Shared handles for the HTTP layer. Everything is behind an Arc so the
/// router can be cloned per connection without duplicating state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogRepository>,
    pub lifecycle: Arc<LifecycleManager>,
    pub inference: Arc<InferenceProxy>,
}

impl AppState {
    pub fn new(
        catalog: Arc<CatalogRepository>,
        docker: Arc<DockerRepository>,
    ) -> Result<Self, reqwest::Error> {
        let lifecycle = Arc::new(LifecycleManager::new(catalog.clone(), docker.clone()));
        let inference = Arc::new(InferenceProxy::new(catalog.clone(), docker)?);
        Ok(Self {
            catalog,
            lifecycle,
            inference,
        })
    }
}
