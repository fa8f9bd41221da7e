use crate::model::{ContainerState, InferenceRequest, InferenceResponse};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::docker_repository::DockerRepository;
use bollard::errors::Error as DockerError;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model {0} is not running. Please start it first.")]
    NotRunning(String),
    #[error("Model {0} has a container but no catalog entry")]
    DefinitionMissing(String),
    #[error("Model server not reachable: {0}")]
    BackendUnreachable(String),
    #[error("Inference backend error: {0}")]
    Backend(String),
    #[error("Error from Docker: {0}")]
    Docker(#[from] DockerError),
}

#[derive(Serialize)]
struct RunnerRequest<'a> {
    prompt: &'a str,
    max_length: u32,
}

pub struct InferenceProxy {
    catalog: Arc<CatalogRepository>,
    docker: Arc<DockerRepository>,
    client: Client,
}

impl InferenceProxy {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(
        catalog: Arc<CatalogRepository>,
        docker: Arc<DockerRepository>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .timeout(Self::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            catalog,
            docker,
            client,
        })
    }

    /// One attempt, no retries. The engine is asked for the container's
    /// current state on every call; catalog or prior status reports are
    /// never trusted for liveness.
    pub async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let container = self.docker.find(&request.model_id).await?;
        let running = container
            .map(|container| container.state == ContainerState::Running)
            .unwrap_or(false);
        if !running {
            return Err(InferenceError::NotRunning(request.model_id));
        }

        let Some(definition) = self.catalog.get(&request.model_id).await else {
            return Err(InferenceError::DefinitionMissing(request.model_id));
        };

        self.forward(definition.container.port, &request).await
    }

    async fn forward(
        &self,
        port: u16,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let url = format!("http://127.0.0.1:{port}/inference");
        debug!("Proxying inference for {} to {}", request.model_id, url);

        let payload = RunnerRequest {
            prompt: &request.prompt,
            max_length: request.max_length,
        };
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Backend(format!("{status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| InferenceError::Backend(err.to_string()))?;
        let Some(text) = body.get("response").and_then(Value::as_str) else {
            return Err(InferenceError::Backend(
                "backend reply is missing the response field".to_string(),
            ));
        };

        Ok(InferenceResponse {
            model_id: request.model_id.clone(),
            response: text.to_string(),
        })
    }
}

fn classify(err: reqwest::Error) -> InferenceError {
    if err.is_connect() {
        InferenceError::BackendUnreachable(err.to_string())
    } else {
        InferenceError::Backend(err.to_string())
    }
}
