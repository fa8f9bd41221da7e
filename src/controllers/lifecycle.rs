use crate::model::ContainerStatus;
use crate::services::lifecycle_manager::LifecycleError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RunModelRequest {
    model_id: String,
}

#[derive(Deserialize)]
pub struct StopModelRequest {
    model_id: String,
}

pub async fn run_model(
    State(state): State<AppState>,
    Json(request): Json<RunModelRequest>,
) -> Result<Json<ContainerStatus>, LifecycleError> {
    let status = state.lifecycle.run_model(&request.model_id).await?;
    Ok(Json(status))
}

pub async fn stop_model(
    State(state): State<AppState>,
    Json(request): Json<StopModelRequest>,
) -> Result<Json<ContainerStatus>, LifecycleError> {
    let status = state.lifecycle.stop_model(&request.model_id).await?;
    Ok(Json(status))
}

pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContainerStatus>>, LifecycleError> {
    let statuses = state.lifecycle.status().await?;
    Ok(Json(statuses))
}
