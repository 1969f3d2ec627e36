//! Maps [`ServiceError`] onto HTTP statuses and the response envelope.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use works_portal_server_models::{ApiErrorBody, ApiResponse};
use works_portal_service::ServiceError;

const REDACTED: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ServiceError);

impl ApiError {
    /// A `400` for input rejected before it reaches a use case.
    #[must_use]
    pub fn invalid(field: &str, rule: impl std::fmt::Display) -> Self {
        Self(ServiceError::invalid(field, rule))
    }

    fn message(&self) -> &'static str {
        match &self.0 {
            ServiceError::Validation(_) => "Validation failed",
            ServiceError::NotFound(_) => "Not found",
            ServiceError::Unauthorized(_) => "Unauthorized",
            ServiceError::Forbidden(_) => "Forbidden",
            ServiceError::Conflict(_) => "Conflict",
            ServiceError::UpstreamUnavailable(_) => "Service unavailable",
            ServiceError::RequestTimeout => "Request timed out",
            ServiceError::Storage(_) | ServiceError::Repository(_) | ServiceError::Internal(_) => {
                REDACTED
            }
        }
    }

    fn body(&self) -> ApiErrorBody {
        match &self.0 {
            ServiceError::Validation(errors) => ApiErrorBody::List(errors.entries().to_vec()),
            ServiceError::NotFound(what) => ApiErrorBody::Message(format!("{what} not found")),
            ServiceError::Unauthorized(detail)
            | ServiceError::Forbidden(detail)
            | ServiceError::Conflict(detail)
            | ServiceError::UpstreamUnavailable(detail) => ApiErrorBody::Message(detail.clone()),
            ServiceError::RequestTimeout => ApiErrorBody::Message(self.0.to_string()),
            ServiceError::Storage(_) | ServiceError::Repository(_) | ServiceError::Internal(_) => {
                ApiErrorBody::Message(REDACTED.to_string())
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Storage(_) | ServiceError::Repository(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{status}: {}", self.0);
        } else {
            log::debug!("{status}: {}", self.0);
        }
        HttpResponse::build(status).json(ApiResponse::failure(self.message(), self.body()))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use works_portal_service::ValidationErrors;

    use super::*;

    async fn rendered(error: ServiceError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(error).error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_rt::test]
    async fn validation_lists_every_rule() {
        let mut errors = ValidationErrors::new();
        errors.push("latitude", "range");
        errors.push("photos", "min=2");
        let (status, body) = rendered(ServiceError::Validation(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], serde_json::json!(["latitude: range", "photos: min=2"]));
    }

    #[actix_rt::test]
    async fn internal_failures_are_redacted() {
        let (status, body) =
            rendered(ServiceError::Internal("connection string postgres://x".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], REDACTED);
        assert!(!body.to_string().contains("postgres"));
    }

    #[actix_rt::test]
    async fn maps_each_kind_to_its_status() {
        for (error, expected) in [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::UpstreamUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::RequestTimeout, StatusCode::GATEWAY_TIMEOUT),
        ] {
            assert_eq!(rendered(error).await.0, expected);
        }
    }
}
