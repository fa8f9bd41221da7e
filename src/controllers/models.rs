use crate::model::ModelDefinition;
use crate::repositories::catalog_repository::CatalogError;
use crate::services::lifecycle_manager::LifecycleError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

#[derive(Serialize)]
pub struct ModelListResponse {
    models: Vec<ModelDefinition>,
}

#[derive(Serialize)]
pub struct DeleteModelResponse {
    status: &'static str,
    model_id: String,
}

pub async fn get_models(State(state): State<AppState>) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        models: state.catalog.list().await,
    })
}

pub async fn register_model(
    State(state): State<AppState>,
    Json(definition): Json<ModelDefinition>,
) -> Result<Json<ModelDefinition>, CatalogError> {
    state.catalog.add(definition.clone()).await?;
    Ok(Json(definition))
}

pub async fn delete_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<DeleteModelResponse>, LifecycleError> {
    state.lifecycle.delete_model(&model_id).await?;
    Ok(Json(DeleteModelResponse {
        status: "deleted",
        model_id,
    }))
}
