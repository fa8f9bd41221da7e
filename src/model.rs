use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    pub image: String,
    pub port: u16,
    #[serde(default)]
    pub gpu: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub id: String,
    pub name: String,
    pub source: String,
    pub repo_id: String,
    #[serde(rename = "container_config")]
    pub container: ContainerConfig,
}

/// Engine-side view of a model's container, built from inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedContainer {
    pub id: String,
    pub state: ContainerState,
    pub host_port: Option<u16>,
}

/// Runtime report for a model, rebuilt on every call and never stored.
#[derive(Serialize, Debug, Clone)]
pub struct ContainerStatus {
    pub model_id: String,
    pub status: ContainerState,
    pub container_id: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Stopped,
    Removed,
    NotFound,
    Unknown,
    Error(String),
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ContainerState::Created => "created",
            ContainerState::Running => "running",
            ContainerState::Paused => "paused",
            ContainerState::Restarting => "restarting",
            ContainerState::Removing => "removing",
            ContainerState::Exited => "exited",
            ContainerState::Dead => "dead",
            ContainerState::Stopped => "stopped",
            ContainerState::Removed => "removed",
            ContainerState::NotFound => "not_found",
            ContainerState::Unknown => "unknown",
            ContainerState::Error(message) => return write!(f, "error: {message}"),
        };
        write!(f, "{tag}")
    }
}

impl Serialize for ContainerState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InferenceRequest {
    pub model_id: String,
    pub prompt: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
}

fn default_max_length() -> u32 {
    100
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InferenceResponse {
    pub model_id: String,
    pub response: String,
}
