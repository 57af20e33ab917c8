use crate::http::AppState;
use crate::http::extract::{Payload, ResourceId};
use crate::http::response::{ApiError, ApiSuccess};
use crate::http::serializers::{AuthorHttpResponse, Mode, parse_create_author, parse_update_author};
use crate::models::{DeleteAuthorRequest, FindAuthorRequest};
use axum::extract::State;
use axum::http::StatusCode;

pub async fn list_authors(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    let authors = state.authors().find_all_authors().await?;
    let body = authors.into_iter().map(AuthorHttpResponse::from).collect();
    Ok(ApiSuccess::ok(body))
}

pub async fn create_author(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let req = parse_create_author(&payload)?;
    let author = state.authors().create_author(&req).await?;
    tracing::info!(id = author.id(), name = %author, "author created");
    Ok(ApiSuccess::created(author.into()))
}

pub async fn retrieve_author(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let author = state
        .authors()
        .find_author(&FindAuthorRequest::new(id))
        .await?;
    Ok(ApiSuccess::ok(author.into()))
}

pub async fn replace_author(
    state: State<AppState>,
    id: ResourceId,
    payload: Payload,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    update_author(state, id, payload, Mode::Full).await
}

pub async fn partial_update_author(
    state: State<AppState>,
    id: ResourceId,
    payload: Payload,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    update_author(state, id, payload, Mode::Partial).await
}

async fn update_author(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    Payload(payload): Payload,
    mode: Mode,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    state
        .authors()
        .find_author(&FindAuthorRequest::new(id))
        .await?;

    let req = parse_update_author(id, &payload, mode)?;
    let author = state.authors().update_author(&req).await?;
    Ok(ApiSuccess::ok(author.into()))
}

/// Removes the author together with every book that references it.
pub async fn delete_author(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    state
        .authors()
        .delete_author(&DeleteAuthorRequest::new(id))
        .await?;
    tracing::info!(id, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}
