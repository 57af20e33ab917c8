use crate::http::AppState;
use crate::http::response::ApiError;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;

const TOKEN_KEYWORD: &str = "token";
const FORMAT_SUFFIX: &str = ".json";

const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
const NO_CREDENTIALS: &str = "Invalid token header. No credentials provided.";
const CONTAINS_SPACES: &str = "Invalid token header. Token string should not contain spaces.";
const INVALID_CHARACTERS: &str =
    "Invalid token header. Token string should not contain invalid characters.";

/// Rejects requests without a valid `Authorization: Token <key>` header and
/// attaches the resolved [`Principal`](crate::models::Principal) to the request.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = token_from_headers(request.headers())?;
    let principal = state.tokens().resolve(&key).await.inspect_err(|err| {
        tracing::warn!(%err, path = %request.uri().path(), "rejected token");
    })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Reads the token key. A missing header or a different scheme counts as no
/// credentials at all.
pub fn token_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Unauthenticated(NOT_PROVIDED.into()));
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthenticated(INVALID_CHARACTERS.into()))?;

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Err(ApiError::Unauthenticated(NOT_PROVIDED.into())),
    }

    match (parts.next(), parts.next()) {
        (None, _) => Err(ApiError::Unauthenticated(NO_CREDENTIALS.into())),
        (Some(key), None) => Ok(key.to_owned()),
        (Some(_), Some(_)) => Err(ApiError::Unauthenticated(CONTAINS_SPACES.into())),
    }
}

/// Rewrites `/api/books.json` and `/api/books/1.json` to their slash forms so
/// the router only knows one spelling of each route.
pub async fn strip_format_suffix(mut request: Request, next: Next) -> Response {
    if let Some(path) = without_format_suffix(request.uri().path()) {
        let rewritten = match request.uri().query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        match rewritten.parse::<Uri>() {
            Ok(uri) => *request.uri_mut() = uri,
            Err(err) => tracing::debug!(%err, "left unparseable rewritten uri alone"),
        }
    }

    next.run(request).await
}

fn without_format_suffix(path: &str) -> Option<String> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let stem = trimmed.strip_suffix(FORMAT_SUFFIX)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(format!("{stem}/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn detail(result: Result<String, ApiError>) -> String {
        match result {
            Err(ApiError::Unauthenticated(detail)) => detail,
            other => panic!("expected unauthenticated, got {other:?}"),
        }
    }

    #[test]
    fn reads_token_key() {
        assert_eq!(token_from_headers(&headers("Token abc123")).unwrap(), "abc123");
        assert_eq!(token_from_headers(&headers("token abc123")).unwrap(), "abc123");
    }

    #[test]
    fn missing_or_foreign_scheme_is_not_provided() {
        assert_eq!(detail(token_from_headers(&HeaderMap::new())), NOT_PROVIDED);
        assert_eq!(detail(token_from_headers(&headers("Bearer abc"))), NOT_PROVIDED);
    }

    #[test]
    fn malformed_token_headers() {
        assert_eq!(detail(token_from_headers(&headers("Token"))), NO_CREDENTIALS);
        assert_eq!(detail(token_from_headers(&headers("Token a b"))), CONTAINS_SPACES);
    }

    #[test]
    fn format_suffix_paths() {
        assert_eq!(
            without_format_suffix("/api/books.json").as_deref(),
            Some("/api/books/")
        );
        assert_eq!(
            without_format_suffix("/api/books/1.json").as_deref(),
            Some("/api/books/1/")
        );
        assert_eq!(
            without_format_suffix("/api/authors/2.json/").as_deref(),
            Some("/api/authors/2/")
        );
        assert_eq!(without_format_suffix("/api/books/"), None);
        assert_eq!(without_format_suffix("/api/books/.json"), None);
    }
}
