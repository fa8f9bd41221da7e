mod app_error;
mod cli;
mod controllers;
mod model;
mod repositories;
mod services;
mod state;

use crate::cli::Cli;
use crate::controllers::health::{get_health, get_root};
use crate::controllers::inference::post_inference;
use crate::controllers::lifecycle::{get_status, run_model, stop_model};
use crate::controllers::models::{delete_model, get_models, register_model};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::docker_repository::DockerRepository;
use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    enable_logging(cli.verbose);
    let Some(catalog) = CatalogRepository::from_path(cli.catalog_path) else {
        return Ok(ExitCode::FAILURE);
    };
    let docker = DockerRepository::new()?;
    let state = AppState::new(Arc::new(catalog), Arc::new(docker))?;
    let app = router(state);

    // run it
    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(ExitCode::SUCCESS)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
        .route("/models", get(get_models).post(register_model))
        .route("/models/{model_id}", delete(delete_model))
        .route("/run", post(run_model))
        .route("/stop", post(stop_model))
        .route("/status", get(get_status))
        .route("/inference", post(post_inference))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
}

fn enable_logging(verbose: u8) {
    let log_level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    async fn spawn_app(temp_dir: &TempDir) -> String {
        let catalog = CatalogRepository::from_path(temp_dir.path().join("models.yaml"))
            .expect("catalog");
        let docker = DockerRepository::new().expect("docker client");
        let state = AppState::new(Arc::new(catalog), Arc::new(docker)).expect("state");
        let app = router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}")
    }

    fn definition_body(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Tiny Llama",
            "source": "huggingface",
            "repo_id": "org/tiny-llama",
            "container_config": {"image": "runner:latest", "port": 8001}
        })
    }

    #[tokio::test]
    async fn health_endpoints_respond() {
        let temp_dir = TempDir::new().expect("temp dir");
        let base = spawn_app(&temp_dir).await;
        let client = reqwest::Client::new();

        let banner: Value = client
            .get(format!("{base}/"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(banner["message"], "Model orchestrator is running");

        let health: Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(health["status"], "ok");
        assert_eq!(health["service"], "orchestrator");
    }

    #[tokio::test]
    async fn catalog_crud_over_http() {
        let temp_dir = TempDir::new().expect("temp dir");
        let base = spawn_app(&temp_dir).await;
        let client = reqwest::Client::new();

        let listed: Value = client
            .get(format!("{base}/models"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(listed["models"], json!([]));

        let created = client
            .post(format!("{base}/models"))
            .json(&definition_body("itest-tiny-llama"))
            .send()
            .await
            .expect("request");
        assert_eq!(created.status(), 200);
        let echoed: Value = created.json().await.expect("json");
        assert_eq!(echoed["id"], "itest-tiny-llama");
        assert_eq!(echoed["container_config"]["port"], 8001);

        let duplicate = client
            .post(format!("{base}/models"))
            .json(&definition_body("itest-tiny-llama"))
            .send()
            .await
            .expect("request");
        assert_eq!(duplicate.status(), 400);
        assert!(
            duplicate
                .text()
                .await
                .expect("body")
                .contains("already exists")
        );

        let listed: Value = client
            .get(format!("{base}/models"))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        assert_eq!(listed["models"].as_array().expect("array").len(), 1);

        let deleted = client
            .delete(format!("{base}/models/itest-tiny-llama"))
            .send()
            .await
            .expect("request");
        assert_eq!(deleted.status(), 200);
        let body: Value = deleted.json().await.expect("json");
        assert_eq!(body["status"], "deleted");
        assert_eq!(body["model_id"], "itest-tiny-llama");

        let missing = client
            .delete(format!("{base}/models/itest-tiny-llama"))
            .send()
            .await
            .expect("request");
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn run_rejects_unknown_model() {
        let temp_dir = TempDir::new().expect("temp dir");
        let base = spawn_app(&temp_dir).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/run"))
            .json(&json!({"model_id": "ghost"}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 404);
    }

    // Needs a reachable Docker daemon. Opt in with ORCHESTRATOR_DOCKER_TESTS=1.
    async fn docker_daemon_reachable() -> bool {
        if std::env::var("ORCHESTRATOR_DOCKER_TESTS").is_err() {
            return false;
        }
        match bollard::Docker::connect_with_local_defaults() {
            Ok(docker) => docker.ping().await.is_ok(),
            Err(_) => false,
        }
    }

    #[tokio::test]
    async fn stop_without_container_is_not_found_over_http() {
        if !docker_daemon_reachable().await {
            return;
        }
        let temp_dir = TempDir::new().expect("temp dir");
        let base = spawn_app(&temp_dir).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/stop"))
            .json(&json!({"model_id": "itest-absent"}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 404);
        assert!(
            response
                .text()
                .await
                .expect("body")
                .contains("No container found")
        );
    }

    #[tokio::test]
    async fn register_rejects_malformed_definition() {
        let temp_dir = TempDir::new().expect("temp dir");
        let base = spawn_app(&temp_dir).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/models"))
            .json(&json!({"id": "broken"}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), 422);
    }
}
