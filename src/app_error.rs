use crate::repositories::catalog_repository::CatalogError;
use crate::services::inference_proxy::InferenceError;
use crate::services::lifecycle_manager::LifecycleError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::DuplicateId(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Io(_) | CatalogError::Confy(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = match &self {
            LifecycleError::ModelNotFound(_) | LifecycleError::ContainerNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LifecycleError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            LifecycleError::Catalog(CatalogError::DuplicateId(_)) => StatusCode::BAD_REQUEST,
            LifecycleError::StartFailed(_)
            | LifecycleError::Docker(_)
            | LifecycleError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

impl IntoResponse for InferenceError {
    fn into_response(self) -> Response {
        let status = match &self {
            InferenceError::NotRunning(_) => StatusCode::BAD_REQUEST,
            InferenceError::DefinitionMissing(_) => StatusCode::NOT_FOUND,
            InferenceError::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
            InferenceError::Backend(_) | InferenceError::Docker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_maps_to_bad_request() {
        let response = CatalogError::DuplicateId("tiny".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_model_maps_to_not_found() {
        let response = LifecycleError::ModelNotFound("tiny".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = LifecycleError::Catalog(CatalogError::NotFound("tiny".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn absent_container_maps_to_not_found() {
        let response = LifecycleError::ContainerNotFound("tiny".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn start_failure_maps_to_internal_error() {
        let response =
            LifecycleError::StartFailed("image missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn stopped_model_maps_to_bad_request() {
        let response = InferenceError::NotRunning("tiny".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn orphan_container_maps_to_not_found() {
        let response = InferenceError::DefinitionMissing("tiny".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unreachable_backend_maps_to_bad_gateway() {
        let response =
            InferenceError::BackendUnreachable("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
