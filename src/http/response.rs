use crate::http::serializers::FieldErrors;
use crate::models::{
    CreateAuthorError, CreateBookError, DeleteAuthorError, DeleteBookError, FindAllAuthorsError,
    FindAllBooksError, FindAuthorError, FindBookError, IssueTokenError, ResolveTokenError,
    UpdateAuthorError, UpdateBookError,
};
use axum::extract::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(data))
    }

    pub const fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }

    pub const fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, data)
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(String),
    InvalidCredentials,
    Validation(FieldErrors),
    BadRequest(String),
    NotFound,
    UnsupportedMediaType(String),
    InternalServerError(anyhow::Error),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials | Self::Validation(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthenticated(detail) => (
                status,
                [(header::WWW_AUTHENTICATE, "Token")],
                Json(json!({ "detail": detail })),
            )
                .into_response(),
            Self::InvalidCredentials => (
                status,
                Json(json!({ "non_field_errors": [INVALID_CREDENTIALS] })),
            )
                .into_response(),
            Self::Validation(errors) => (status, Json(errors)).into_response(),
            Self::BadRequest(detail) | Self::UnsupportedMediaType(detail) => {
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            Self::NotFound => (status, Json(json!({ "detail": "Not found." }))).into_response(),
            Self::InternalServerError(cause) => {
                tracing::error!(error = ?cause, "request failed");
                (status, Json(json!({ "detail": "Internal server error" }))).into_response()
            }
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<ResolveTokenError> for ApiError {
    fn from(err: ResolveTokenError) -> Self {
        match err {
            ResolveTokenError::Other(cause) => Self::InternalServerError(cause),
            err => Self::Unauthenticated(err.to_string()),
        }
    }
}

impl From<IssueTokenError> for ApiError {
    fn from(err: IssueTokenError) -> Self {
        match err {
            IssueTokenError::InvalidCredentials => Self::InvalidCredentials,
            IssueTokenError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        Self::InternalServerError(err.0)
    }
}

impl From<FindAuthorError> for ApiError {
    fn from(err: FindAuthorError) -> Self {
        match err {
            FindAuthorError::NotFound { .. } => Self::NotFound,
            FindAuthorError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<FindAllAuthorsError> for ApiError {
    fn from(err: FindAllAuthorsError) -> Self {
        Self::InternalServerError(err.0)
    }
}

impl From<UpdateAuthorError> for ApiError {
    fn from(err: UpdateAuthorError) -> Self {
        match err {
            UpdateAuthorError::NotFound { .. } => Self::NotFound,
            UpdateAuthorError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<DeleteAuthorError> for ApiError {
    fn from(err: DeleteAuthorError) -> Self {
        match err {
            DeleteAuthorError::NotFound { .. } => Self::NotFound,
            DeleteAuthorError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<CreateBookError> for ApiError {
    fn from(err: CreateBookError) -> Self {
        match err {
            CreateBookError::AuthorNotFound { author_id } => {
                Self::Validation(FieldErrors::missing_author(author_id))
            }
            CreateBookError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<FindBookError> for ApiError {
    fn from(err: FindBookError) -> Self {
        match err {
            FindBookError::NotFound { .. } => Self::NotFound,
            FindBookError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<FindAllBooksError> for ApiError {
    fn from(err: FindAllBooksError) -> Self {
        Self::InternalServerError(err.0)
    }
}

impl From<UpdateBookError> for ApiError {
    fn from(err: UpdateBookError) -> Self {
        match err {
            UpdateBookError::NotFound { .. } => Self::NotFound,
            UpdateBookError::AuthorNotFound { author_id } => {
                Self::Validation(FieldErrors::missing_author(author_id))
            }
            UpdateBookError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

impl From<DeleteBookError> for ApiError {
    fn from(err: DeleteBookError) -> Self {
        match err {
            DeleteBookError::NotFound { .. } => Self::NotFound,
            DeleteBookError::Other(cause) => Self::InternalServerError(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn unauthenticated_carries_challenge_header() {
        let response = ApiError::from(ResolveTokenError::InvalidToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Token");
    }

    #[test]
    fn missing_author_maps_to_validation() {
        let err = ApiError::from(UpdateBookError::AuthorNotFound { author_id: 5 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            ApiError::from(FindBookError::NotFound { id: 1 }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DeleteAuthorError::NotFound { id: 1 }).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_errors_hide_cause() {
        let err = ApiError::from(FindAllBooksError(anyhow!("disk on fire")));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
