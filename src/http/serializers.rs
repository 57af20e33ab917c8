//! Wire representations and field validation.
//!
//! Incoming bodies are read field by field through [`FieldReader`], which records
//! every failure instead of stopping at the first one. Handlers turn the
//! collected [`FieldErrors`] into a single 400 response.

use crate::http::response::ApiError;
use crate::models::{
    Author, Book, CreateAuthorRequest, CreateBookRequest, Credentials, FindAuthorError,
    FindAuthorRequest, RequiredText, UpdateAuthorRequest, UpdateBookRequest,
};
use crate::repositories::AuthorRepository;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";
const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Messages keyed by field name, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn missing_author(author_id: i64) -> Self {
        Self::single("author", missing_pk(author_id))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

fn missing_pk(id: i64) -> String {
    format!(r#"Invalid pk "{id}" - object does not exist."#)
}

/// JSON type name used in validation messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether absent fields are errors (`Full`, used by create and replace) or
/// simply left out (`Partial`, used by partial update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Partial,
}

pub struct FieldReader<'a> {
    payload: &'a Map<String, Value>,
    mode: Mode,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(payload: &'a Map<String, Value>, mode: Mode) -> Self {
        Self {
            payload,
            mode,
            errors: FieldErrors::default(),
        }
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Returns the raw value, or `None` after recording a required/null error.
    /// Absent fields in partial mode return `None` without an error.
    fn present(&mut self, field: &str) -> Option<&'a Value> {
        match self.payload.get(field) {
            None => {
                if self.mode == Mode::Full {
                    self.errors.add(field, REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.errors.add(field, NOT_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, field: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.errors.add(field, NOT_A_STRING);
                None
            }
        }
    }

    /// Non-blank text, trimmed.
    pub fn text(&mut self, field: &str) -> Option<RequiredText> {
        let value = self.present(field)?;
        let raw = self.string(field, value)?;
        match RequiredText::new(&raw) {
            Ok(text) => Some(text),
            Err(err) => {
                self.errors.add(field, err.to_string());
                None
            }
        }
    }

    /// Non-blank text kept exactly as sent.
    pub fn secret(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        let raw = self.string(field, value)?;
        if raw.is_empty() {
            self.errors.add(field, "This field may not be blank.");
            return None;
        }
        Some(raw)
    }

    /// Text that may be absent, null or blank. The outer `Option` reports whether
    /// the field was supplied at all.
    pub fn optional_text(&mut self, field: &str) -> Option<Option<String>> {
        match self.payload.get(field)? {
            Value::Null => Some(None),
            value => self.string(field, value).map(Some),
        }
    }

    pub fn date(&mut self, field: &str) -> Option<NaiveDate> {
        let value = self.present(field)?;
        let parsed = value
            .as_str()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok());
        if parsed.is_none() {
            self.errors.add(field, BAD_DATE);
        }
        parsed
    }

    /// Integer id of a related record. Numeric strings are accepted since form
    /// bodies carry every value as text.
    pub fn primary_key(&mut self, field: &str) -> Option<i64> {
        let value = self.present(field)?;
        let id = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if id.is_none() {
            self.errors.add(
                field,
                format!(
                    "Incorrect type. Expected pk value, received {}.",
                    type_name(value)
                ),
            );
        }
        id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorHttpResponse {
    id: i64,
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
}

impl From<Author> for AuthorHttpResponse {
    fn from(value: Author) -> Self {
        Self {
            id: value.id(),
            first_name: value.first_name().to_string(),
            last_name: value.last_name().to_string(),
            birth_date: value.birth_date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookHttpResponse {
    id: i64,
    title: String,
    author: i64,
    description: Option<String>,
    pub_date: NaiveDate,
}

impl From<Book> for BookHttpResponse {
    fn from(value: Book) -> Self {
        Self {
            id: value.id(),
            title: value.title().to_string(),
            author: value.author_id(),
            description: value.description().map(str::to_owned),
            pub_date: value.pub_date(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenHttpResponse {
    token: String,
}

impl TokenHttpResponse {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_owned(),
        }
    }
}

pub fn parse_create_author(
    payload: &Map<String, Value>,
) -> Result<CreateAuthorRequest, FieldErrors> {
    let mut fields = FieldReader::new(payload, Mode::Full);
    let first_name = fields.text("first_name");
    let last_name = fields.text("last_name");
    let birth_date = fields.date("birth_date");

    match (first_name, last_name, birth_date) {
        (Some(first_name), Some(last_name), Some(birth_date)) => {
            fields.finish()?;
            Ok(CreateAuthorRequest::new(first_name, last_name, birth_date))
        }
        _ => Err(fields.errors),
    }
}

pub fn parse_update_author(
    id: i64,
    payload: &Map<String, Value>,
    mode: Mode,
) -> Result<UpdateAuthorRequest, FieldErrors> {
    let mut fields = FieldReader::new(payload, mode);
    let mut req = UpdateAuthorRequest::new(id);

    if let Some(first_name) = fields.text("first_name") {
        req.set_first_name(first_name);
    }
    if let Some(last_name) = fields.text("last_name") {
        req.set_last_name(last_name);
    }
    if let Some(birth_date) = fields.date("birth_date") {
        req.set_birth_date(birth_date);
    }

    fields.finish()?;
    Ok(req)
}

pub async fn parse_create_book(
    payload: &Map<String, Value>,
    authors: &dyn AuthorRepository,
) -> Result<CreateBookRequest, ApiError> {
    let mut fields = FieldReader::new(payload, Mode::Full);
    let title = fields.text("title");
    let author_id = fields.primary_key("author");
    let description = fields.optional_text("description").flatten();
    let pub_date = fields.date("pub_date");

    if let Some(author_id) = author_id {
        check_author(&mut fields, author_id, authors).await?;
    }

    match (title, author_id, pub_date) {
        (Some(title), Some(author_id), Some(pub_date)) => {
            fields.finish()?;
            Ok(CreateBookRequest::new(title, author_id, description, pub_date))
        }
        _ => Err(fields.errors.into()),
    }
}

/// Builds a book update. In full mode an absent `description` clears it.
pub async fn parse_update_book(
    id: i64,
    payload: &Map<String, Value>,
    mode: Mode,
    authors: &dyn AuthorRepository,
) -> Result<UpdateBookRequest, ApiError> {
    let mut fields = FieldReader::new(payload, mode);
    let mut req = UpdateBookRequest::new(id);

    if let Some(title) = fields.text("title") {
        req.set_title(title);
    }
    if let Some(author_id) = fields.primary_key("author") {
        check_author(&mut fields, author_id, authors).await?;
        req.set_author_id(author_id);
    }
    match fields.optional_text("description") {
        Some(description) => req.set_description(description),
        None if mode == Mode::Full => req.set_description(None),
        None => {}
    }
    if let Some(pub_date) = fields.date("pub_date") {
        req.set_pub_date(pub_date);
    }

    fields.finish()?;
    Ok(req)
}

async fn check_author(
    fields: &mut FieldReader<'_>,
    author_id: i64,
    authors: &dyn AuthorRepository,
) -> Result<(), ApiError> {
    match authors.find_author(&FindAuthorRequest::new(author_id)).await {
        Ok(_) => Ok(()),
        Err(FindAuthorError::NotFound { .. }) => {
            fields.errors.add("author", missing_pk(author_id));
            Ok(())
        }
        Err(FindAuthorError::Other(cause)) => Err(ApiError::InternalServerError(cause)),
    }
}

pub fn parse_credentials(payload: &Map<String, Value>) -> Result<Credentials, FieldErrors> {
    let mut fields = FieldReader::new(payload, Mode::Full);
    let username = fields.text("username");
    let password = fields.secret("password");

    match (username, password) {
        (Some(username), Some(password)) => {
            fields.finish()?;
            Ok(Credentials::new(username.to_string(), password))
        }
        _ => Err(fields.errors),
    }
}

impl std::fmt::Debug for FieldReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldReader")
            .field("mode", &self.mode)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn create_author_collects_every_field_error() {
        let payload = object(json!({ "first_name": "  ", "birth_date": "01/01/1980" }));
        let errors = parse_create_author(&payload).unwrap_err();

        assert_eq!(
            errors.get("first_name"),
            Some(&["This field may not be blank.".to_string()][..])
        );
        assert_eq!(errors.get("last_name"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("birth_date"), Some(&[BAD_DATE.to_string()][..]));
    }

    #[test]
    fn create_author_accepts_valid_payload() {
        let payload = object(json!({
            "first_name": "John",
            "last_name": "Doe",
            "birth_date": "1980-01-01",
        }));
        let req = parse_create_author(&payload).unwrap();

        assert_eq!(req.first_name().as_str(), "John");
        assert_eq!(req.birth_date(), NaiveDate::from_ymd_opt(1980, 1, 1).unwrap());
    }

    #[test]
    fn partial_update_skips_absent_fields() {
        let payload = object(json!({ "last_name": "Smith" }));
        let req = parse_update_author(4, &payload, Mode::Partial).unwrap();

        assert!(req.first_name().is_none());
        assert_eq!(req.last_name().map(RequiredText::as_str), Some("Smith"));

        let errors = parse_update_author(4, &payload, Mode::Full).unwrap_err();
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("last_name").is_none());
    }

    #[test]
    fn null_is_rejected_for_required_fields() {
        let payload = object(json!({ "first_name": null }));
        let errors = parse_update_author(1, &payload, Mode::Partial).unwrap_err();
        assert_eq!(errors.get("first_name"), Some(&[NOT_NULL.to_string()][..]));
    }

    #[test]
    fn primary_key_accepts_numbers_and_numeric_strings() {
        let payload = object(json!({ "a": 3, "b": "4", "c": true, "d": "x" }));
        let mut fields = FieldReader::new(&payload, Mode::Full);

        assert_eq!(fields.primary_key("a"), Some(3));
        assert_eq!(fields.primary_key("b"), Some(4));
        assert_eq!(fields.primary_key("c"), None);
        assert_eq!(fields.primary_key("d"), None);

        let errors = fields.finish().unwrap_err();
        assert_eq!(
            errors.get("c"),
            Some(&["Incorrect type. Expected pk value, received boolean.".to_string()][..])
        );
        assert_eq!(
            errors.get("d"),
            Some(&["Incorrect type. Expected pk value, received string.".to_string()][..])
        );
    }

    /// Author store that only knows which ids exist.
    struct KnownAuthors(Vec<i64>);

    #[async_trait::async_trait]
    impl AuthorRepository for KnownAuthors {
        async fn create_author(
            &self,
            _: &CreateAuthorRequest,
        ) -> Result<Author, crate::models::CreateAuthorError> {
            unimplemented!()
        }

        async fn find_author(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError> {
            if self.0.contains(&req.id()) {
                Ok(Author::new(
                    req.id(),
                    RequiredText::new_unchecked("A".into()),
                    RequiredText::new_unchecked("B".into()),
                    NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                ))
            } else {
                Err(FindAuthorError::NotFound { id: req.id() })
            }
        }

        async fn find_all_authors(
            &self,
        ) -> Result<Vec<Author>, crate::models::FindAllAuthorsError> {
            unimplemented!()
        }

        async fn update_author(
            &self,
            _: &UpdateAuthorRequest,
        ) -> Result<Author, crate::models::UpdateAuthorError> {
            unimplemented!()
        }

        async fn delete_author(
            &self,
            _: &crate::models::DeleteAuthorRequest,
        ) -> Result<(), crate::models::DeleteAuthorError> {
            unimplemented!()
        }
    }

    fn validation_errors(err: ApiError) -> FieldErrors {
        match err {
            ApiError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn book_description_is_optional() {
        let payload = object(json!({ "title": "T", "author": 1, "pub_date": "2023-01-01" }));
        let req = parse_create_book(&payload, &KnownAuthors(vec![1]))
            .await
            .unwrap();

        assert_eq!(req.description(), None);
        assert_eq!(req.author_id(), 1);
    }

    #[tokio::test]
    async fn unknown_author_is_reported_with_other_field_errors() {
        let payload = object(json!({ "title": "", "author": 99, "pub_date": "2023-01-01" }));
        let err = parse_create_book(&payload, &KnownAuthors(vec![1]))
            .await
            .unwrap_err();
        let errors = validation_errors(err);

        assert_eq!(
            errors.get("author"),
            Some(&[r#"Invalid pk "99" - object does not exist."#.to_string()][..])
        );
        assert!(errors.get("title").is_some());
        assert!(errors.get("pub_date").is_none());
    }

    #[tokio::test]
    async fn full_book_update_clears_absent_description() {
        let payload = object(json!({ "title": "T", "author": 1, "pub_date": "2023-01-01" }));
        let authors = KnownAuthors(vec![1]);

        let req = parse_update_book(1, &payload, Mode::Full, &authors)
            .await
            .unwrap();
        assert_eq!(req.description(), Some(None));

        let req = parse_update_book(1, &payload, Mode::Partial, &authors)
            .await
            .unwrap();
        assert_eq!(req.description(), None);
    }

    #[test]
    fn missing_author_message_names_the_id() {
        let errors = FieldErrors::missing_author(99);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "author": [r#"Invalid pk "99" - object does not exist."#] })
        );
    }

    #[test]
    fn password_is_not_trimmed() {
        let payload = object(json!({ "username": " a ", "password": " pw " }));
        let credentials = parse_credentials(&payload).unwrap();

        assert_eq!(credentials.username(), "a");
        assert_eq!(credentials.password(), " pw ");
    }
}
