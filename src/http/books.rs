use crate::http::AppState;
use crate::http::extract::{Payload, ResourceId};
use crate::http::response::{ApiError, ApiSuccess};
use crate::http::serializers::{BookHttpResponse, Mode, parse_create_book, parse_update_book};
use crate::models::{DeleteBookRequest, FindBookRequest};
use axum::extract::State;
use axum::http::StatusCode;

pub async fn list_books(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    let books = state.books().find_all_books().await?;
    let body = books.into_iter().map(BookHttpResponse::from).collect();
    Ok(ApiSuccess::ok(body))
}

pub async fn create_book(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let req = parse_create_book(&payload, state.authors()).await?;
    let book = state.books().create_book(&req).await?;
    tracing::info!(id = book.id(), author = book.author_id(), "book created");
    Ok(ApiSuccess::created(book.into()))
}

pub async fn retrieve_book(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let book = state.books().find_book(&FindBookRequest::new(id)).await?;
    Ok(ApiSuccess::ok(book.into()))
}

pub async fn replace_book(
    state: State<AppState>,
    id: ResourceId,
    payload: Payload,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    update_book(state, id, payload, Mode::Full).await
}

pub async fn partial_update_book(
    state: State<AppState>,
    id: ResourceId,
    payload: Payload,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    update_book(state, id, payload, Mode::Partial).await
}

async fn update_book(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    Payload(payload): Payload,
    mode: Mode,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    // Unknown ids are 404 even when the body is also invalid.
    state.books().find_book(&FindBookRequest::new(id)).await?;

    let req = parse_update_book(id, &payload, mode, state.authors()).await?;
    let book = state.books().update_book(&req).await?;
    Ok(ApiSuccess::ok(book.into()))
}

pub async fn delete_book(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    state.books().delete_book(&DeleteBookRequest::new(id)).await?;
    tracing::info!(id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
