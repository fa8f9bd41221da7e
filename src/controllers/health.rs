use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct BannerResponse {
    message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

pub async fn get_root() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Model orchestrator is running",
    })
}

pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "orchestrator",
    })
}
