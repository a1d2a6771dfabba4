use application::ApplicationError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::DomainError;
use serde::Serialize;
use tracing::{error, info, warn};

/// JSON body returned with 4xx/5xx responses that carry detail.
#[derive(Serialize, Debug)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }
}

fn field_of(err: &DomainError) -> Option<String> {
    match err {
        DomainError::MissingField(field) => Some(field.clone()),
        DomainError::InvalidFieldValue { field, .. } => Some(field.clone()),
        DomainError::InvalidIdentity(_) => None,
    }
}

/// Turns a rejected JSON body (malformed syntax, wrong types, missing
/// content type) into an input error.
pub fn body_rejection(rejection: JsonRejection) -> ApplicationError {
    ApplicationError::InvalidInput(rejection.body_text())
}

/// Helper function to map ApplicationError to HTTP status codes and response body.
pub fn map_application_error_to_response(err: ApplicationError) -> Response {
    match err {
        // Not-found responses carry no body
        ApplicationError::NotFound(what) => {
            info!("Responding 404: {} not found", what);
            StatusCode::NOT_FOUND.into_response()
        }
        ApplicationError::DomainError(domain_err) => {
            warn!("Domain validation failed: {}", domain_err);
            let body = ErrorBody {
                error: domain_err.to_string(),
                field: field_of(&domain_err),
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        ApplicationError::InvalidInput(msg) => {
            warn!("Invalid input: {}", msg);
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(msg))).into_response()
        }
        ApplicationError::Unsupported(what) => {
            warn!("Unsupported operation requested: {}", what);
            (
                StatusCode::NOT_IMPLEMENTED,
                Json(ErrorBody::new(format!("Operation not supported: {}", what))),
            )
                .into_response()
        }
        ApplicationError::Storage { operation, source } => {
            error!(operation = %operation, "Underlying storage error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("An internal server error occurred")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let response = map_application_error_to_response(ApplicationError::NotFound(
            "Item 'x'".to_string(),
        ));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn validation_failure_names_the_field() {
        let response = map_application_error_to_response(ApplicationError::DomainError(
            DomainError::InvalidFieldValue {
                field: "price".to_string(),
                reason: "must be between 1 and 1000, got 0".to_string(),
            },
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["field"], "price");
    }

    #[tokio::test]
    async fn unsupported_maps_to_not_implemented() {
        let response = map_application_error_to_response(ApplicationError::Unsupported(
            "listing comments of a post".to_string(),
        ));
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn storage_failure_hides_detail() {
        let response = map_application_error_to_response(ApplicationError::storage(
            "insert item",
            "connection refused",
        ));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal server error occurred");
        assert!(body.get("field").is_none());
    }
}
