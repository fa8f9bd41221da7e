use crate::model::{ContainerState, ContainerStatus, ManagedContainer, ModelDefinition};
use bollard::models::{
    ContainerCreateBody, ContainerStateStatusEnum, DeviceRequest, HostConfig, PortBinding, PortMap,
};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, InspectContainerOptionsBuilder, ListContainersOptionsBuilder,
    RemoveContainerOptionsBuilder, StartContainerOptionsBuilder, StopContainerOptionsBuilder,
};
use bollard::{Docker, errors::Error as DockerError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, info, warn};

/// Label key holding the owning model id. Used for discovery only.
pub const MODEL_ID_LABEL: &str = "orchestrator.model_id";

pub struct DockerRepository {
    docker: Docker,
}

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("Error initializing docker daemon: {0}")]
    Docker(#[from] DockerError),
}

impl DockerRepository {
    const INFERENCE_PORT: u16 = 8000;

    pub fn new() -> Result<Self, InitializationError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    fn internal_port() -> String {
        format!("{}/tcp", Self::INFERENCE_PORT)
    }

    fn container_name(model_id: &str) -> String {
        format!("orchestrator-{model_id}")
    }

    pub async fn find(&self, model_id: &str) -> Result<Option<ManagedContainer>, DockerError> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        filters.insert(
            "label".to_string(),
            vec![format!("{MODEL_ID_LABEL}={model_id}")],
        );
        let options = ListContainersOptionsBuilder::new()
            .all(true)
            .filters(&filters)
            .build();

        let containers = self.docker.list_containers(Some(options)).await?;
        if containers.len() > 1 {
            warn!("Multiple containers labeled for model {}", model_id);
        }
        let Some(container_id) = containers.into_iter().find_map(|summary| summary.id) else {
            return Ok(None);
        };
        self.snapshot(&container_id).await
    }

    /// State and published ports come from inspect; the list endpoint does
    /// not populate them reliably. A container gone between listing and
    /// inspection reads as absent.
    async fn snapshot(&self, container_id: &str) -> Result<Option<ManagedContainer>, DockerError> {
        let options = InspectContainerOptionsBuilder::new().build();
        let inspect = match self.docker.inspect_container(container_id, Some(options)).await {
            Ok(inspect) => inspect,
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let state = inspect
            .state
            .and_then(|state| state.status)
            .map(map_container_state)
            .unwrap_or(ContainerState::Unknown);
        let host_port = inspect
            .network_settings
            .and_then(|settings| settings.ports)
            .and_then(|ports| ports.get(&Self::internal_port()).cloned())
            .flatten()
            .and_then(|bindings| bindings.into_iter().next())
            .and_then(|binding| binding.host_port)
            .and_then(|port| port.parse::<u16>().ok());

        Ok(Some(ManagedContainer {
            id: inspect.id.unwrap_or_else(|| container_id.to_string()),
            state,
            host_port,
        }))
    }

    /// Converges on one container per model: an existing labeled container
    /// is started and reported as-is, a fresh one is created otherwise.
    /// Engine failures are folded into an error status, never returned.
    pub async fn start(&self, definition: &ModelDefinition) -> ContainerStatus {
        match self.try_start(definition).await {
            Ok(status) => status,
            Err(err) => {
                error!("Failed to start container for {}: {}", definition.id, err);
                ContainerStatus {
                    model_id: definition.id.clone(),
                    status: ContainerState::Error(err.to_string()),
                    container_id: None,
                    port: None,
                }
            }
        }
    }

    async fn try_start(&self, definition: &ModelDefinition) -> Result<ContainerStatus, DockerError> {
        if let Some(existing) = self.find(&definition.id).await? {
            let state = if existing.state == ContainerState::Running {
                existing.state
            } else {
                info!("Starting container: {}", existing.id);
                self.start_container(&existing.id).await?;
                match self.snapshot(&existing.id).await? {
                    Some(refreshed) => refreshed.state,
                    None => ContainerState::Unknown,
                }
            };
            return Ok(ContainerStatus {
                model_id: definition.id.clone(),
                status: state,
                container_id: Some(existing.id),
                port: Some(definition.container.port),
            });
        }

        let container_id = self.create(definition).await?;
        info!("Starting container: {container_id}");
        self.start_container(&container_id).await?;

        // The engine may still report the container as starting here; the
        // inference router re-checks liveness before any request.
        Ok(ContainerStatus {
            model_id: definition.id.clone(),
            status: ContainerState::Running,
            container_id: Some(container_id),
            port: Some(definition.container.port),
        })
    }

    async fn create(&self, definition: &ModelDefinition) -> Result<String, DockerError> {
        let name = Self::container_name(&definition.id);
        info!("Creating container: {name}");

        let options = CreateContainerOptionsBuilder::new().name(&name).build();

        let mut labels = HashMap::new();
        labels.insert(MODEL_ID_LABEL.to_string(), definition.id.clone());

        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        exposed_ports.insert(Self::internal_port(), HashMap::new());

        let mut port_map = PortMap::new();
        port_map.insert(
            Self::internal_port(),
            Some(vec![PortBinding {
                host_port: Some(definition.container.port.to_string()),
                host_ip: Some("0.0.0.0".to_string()),
            }]),
        );

        let device_requests = definition.container.gpu.then(|| {
            vec![DeviceRequest {
                count: Some(-1),
                capabilities: Some(vec![vec!["gpu".to_string()]]),
                ..Default::default()
            }]
        });

        let host_config = HostConfig {
            port_bindings: Some(port_map),
            device_requests,
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(definition.container.image.clone()),
            env: Some(vec![format!("MODEL_REPO_ID={}", definition.repo_id)]),
            labels: Some(labels),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let response = self.docker.create_container(Some(options), body).await?;
        Ok(response.id)
    }

    async fn start_container(&self, container_id: &str) -> Result<(), DockerError> {
        let options = StartContainerOptionsBuilder::new().build();
        match self.docker.start_container(container_id, Some(options)).await {
            // 304 means the container is already started
            Err(DockerError::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            result => result,
        }
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), DockerError> {
        let options = StopContainerOptionsBuilder::new().build();
        match self.docker.stop_container(container_id, Some(options)).await {
            // 304 means the container is already stopped
            Err(DockerError::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            result => result,
        }
    }

    pub async fn stop(&self, model_id: &str) -> Result<ContainerStatus, DockerError> {
        let Some(existing) = self.find(model_id).await? else {
            return Ok(not_found(model_id));
        };

        info!("Stopping container: {}", existing.id);
        self.stop_container(&existing.id).await?;
        Ok(ContainerStatus {
            model_id: model_id.to_string(),
            status: ContainerState::Stopped,
            container_id: Some(existing.id),
            port: None,
        })
    }

    pub async fn remove(&self, model_id: &str) -> Result<ContainerStatus, DockerError> {
        let Some(existing) = self.find(model_id).await? else {
            return Ok(not_found(model_id));
        };

        if let Err(err) = self.stop_container(&existing.id).await {
            warn!("Failed to stop container {} before removal: {}", existing.id, err);
        }

        info!("Removing container: {}", existing.id);
        let options = RemoveContainerOptionsBuilder::new().force(true).build();
        self.docker.remove_container(&existing.id, Some(options)).await?;
        Ok(ContainerStatus {
            model_id: model_id.to_string(),
            status: ContainerState::Removed,
            container_id: None,
            port: None,
        })
    }

    pub async fn list_managed(&self) -> Result<Vec<ContainerStatus>, DockerError> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        filters.insert("label".to_string(), vec![MODEL_ID_LABEL.to_string()]);
        let options = ListContainersOptionsBuilder::new()
            .all(true)
            .filters(&filters)
            .build();

        let containers = self.docker.list_containers(Some(options)).await?;
        let mut statuses = Vec::new();
        for summary in containers {
            let Some(container_id) = summary.id else { continue };
            let Some(model_id) = summary
                .labels
                .as_ref()
                .and_then(|labels| labels.get(MODEL_ID_LABEL))
                .cloned()
            else {
                continue;
            };
            let Some(snapshot) = self.snapshot(&container_id).await? else {
                continue;
            };
            statuses.push(ContainerStatus {
                model_id,
                status: snapshot.state,
                container_id: Some(snapshot.id),
                port: snapshot.host_port,
            });
        }
        Ok(statuses)
    }
}

fn not_found(model_id: &str) -> ContainerStatus {
    ContainerStatus {
        model_id: model_id.to_string(),
        status: ContainerState::NotFound,
        container_id: None,
        port: None,
    }
}

fn map_container_state(status: ContainerStateStatusEnum) -> ContainerState {
    match status {
        ContainerStateStatusEnum::CREATED => ContainerState::Created,
        ContainerStateStatusEnum::RUNNING => ContainerState::Running,
        ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
        ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
        ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
        ContainerStateStatusEnum::EXITED => ContainerState::Exited,
        ContainerStateStatusEnum::DEAD => ContainerState::Dead,
        _ => ContainerState::Unknown,
    }
}
