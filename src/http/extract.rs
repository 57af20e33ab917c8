use crate::http::response::ApiError;
use crate::http::serializers::{FieldErrors, type_name};
use axum::body::Body;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Form, FromRequest, FromRequestParts, Json, Path, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use serde_json::{Map, Value};

/// Largest request body buffered before choosing how to decode it.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Request body as a field map. Accepts a JSON object, or a form-encoded body
/// whose values all arrive as strings. An empty body is an empty map whatever
/// its content type.
#[derive(Debug, Default)]
pub struct Payload(pub Map<String, Value>);

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|err| ApiError::BadRequest(format!("Failed to read request body - {err}")))?;
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let req = Request::from_parts(parts, Body::from(bytes));

        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(form_rejection)?;
            let fields = pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return Ok(Self(fields));
        }

        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ApiError::Validation(FieldErrors::single(
                "non_field_errors",
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    type_name(&other)
                ),
            ))),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::UnsupportedMediaType("Unsupported media type in request.".to_string())
        }
        other => ApiError::BadRequest(format!("JSON parse error - {}", other.body_text())),
    }
}

fn form_rejection(rejection: FormRejection) -> ApiError {
    ApiError::BadRequest(format!("Form parse error - {}", rejection.body_text()))
}

/// Integer id from an item path. Anything else is treated as an unknown record.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        Ok(Self(id))
    }
}
