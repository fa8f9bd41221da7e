use crate::model::{InferenceRequest, InferenceResponse};
use crate::services::inference_proxy::InferenceError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;

pub async fn post_inference(
    State(state): State<AppState>,
    Json(request): Json<InferenceRequest>,
) -> Result<Json<InferenceResponse>, InferenceError> {
    let response = state.inference.infer(request).await?;
    Ok(Json(response))
}
