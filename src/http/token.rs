use crate::http::AppState;
use crate::http::extract::Payload;
use crate::http::response::{ApiError, ApiSuccess};
use crate::http::serializers::{TokenHttpResponse, parse_credentials};
use axum::extract::State;

/// Exchanges a username and password for the account's bearer token.
pub async fn obtain_token(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<ApiSuccess<TokenHttpResponse>, ApiError> {
    let credentials = parse_credentials(&payload)?;
    let token = state.tokens().issue(&credentials).await?;
    Ok(ApiSuccess::ok(TokenHttpResponse::new(token.key())))
}
