use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use telly_core::CatalogError;

pub type AppResult<T> = Result<T, AppError>;

/// Classification attached to error responses as an extension so outer
/// layers can react to a failure without parsing the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Upstream,
    Internal,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub kind: ErrorKind,
}

impl AppError {
    pub fn new(
        status: StatusCode,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            kind,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, ErrorKind::Upstream, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        let mut response = (self.status, body).into_response();
        response.extensions_mut().insert(self.kind);
        response
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(msg) => Self::not_found(msg),
            CatalogError::Validation(msg) => Self::bad_request(msg),
            CatalogError::Upstream {
                status: Some(404),
                message,
            } => Self::new(StatusCode::NOT_FOUND, ErrorKind::Upstream, message),
            CatalogError::Upstream { message, .. } => Self::bad_gateway(message),
            other => {
                tracing::error!(error = %other, "catalog operation failed");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_map_to_statuses() {
        let cases = [
            (CatalogError::NotFound("x".into()), StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (CatalogError::Validation("x".into()), StatusCode::BAD_REQUEST, ErrorKind::Validation),
            (CatalogError::upstream(Some(500), "x"), StatusCode::BAD_GATEWAY, ErrorKind::Upstream),
            (CatalogError::upstream(None, "timeout"), StatusCode::BAD_GATEWAY, ErrorKind::Upstream),
            (CatalogError::upstream(Some(404), "x"), StatusCode::NOT_FOUND, ErrorKind::Upstream),
            (CatalogError::Database("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal),
        ];
        for (err, status, kind) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status, status);
            assert_eq!(app.kind, kind);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let app: AppError = CatalogError::Database("password=hunter2".into()).into();
        assert!(!app.message.contains("hunter2"));
    }

    #[test]
    fn response_carries_kind_extension() {
        let response = AppError::not_found("TV show 1 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.extensions().get::<ErrorKind>(),
            Some(&ErrorKind::NotFound)
        );
    }
}
