use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Text that must contain something other than whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredText(String);

impl RequiredText {
    pub fn new(raw: &str) -> Result<Self, BlankTextError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(BlankTextError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequiredText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("This field may not be blank.")]
pub struct BlankTextError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: i64,
    first_name: RequiredText,
    last_name: RequiredText,
    birth_date: NaiveDate,
}

impl Author {
    pub const fn new(
        id: i64,
        first_name: RequiredText,
        last_name: RequiredText,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            birth_date,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn first_name(&self) -> &RequiredText {
        &self.first_name
    }

    pub const fn last_name(&self) -> &RequiredText {
        &self.last_name
    }

    pub const fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: i64,
    title: RequiredText,
    author_id: i64,
    description: Option<String>,
    pub_date: NaiveDate,
}

impl Book {
    pub const fn new(
        id: i64,
        title: RequiredText,
        author_id: i64,
        description: Option<String>,
        pub_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            title,
            author_id,
            description,
            pub_date,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> &RequiredText {
        &self.title
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub const fn pub_date(&self) -> NaiveDate {
        self.pub_date
    }
}

#[derive(Debug)]
pub struct CreateAuthorRequest {
    first_name: RequiredText,
    last_name: RequiredText,
    birth_date: NaiveDate,
}

impl CreateAuthorRequest {
    pub const fn new(
        first_name: RequiredText,
        last_name: RequiredText,
        birth_date: NaiveDate,
    ) -> Self {
        Self {
            first_name,
            last_name,
            birth_date,
        }
    }

    pub const fn first_name(&self) -> &RequiredText {
        &self.first_name
    }

    pub const fn last_name(&self) -> &RequiredText {
        &self.last_name
    }

    pub const fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct CreateAuthorError(#[from] pub anyhow::Error);

#[derive(Debug)]
pub struct FindAuthorRequest {
    id: i64,
}

impl FindAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum FindAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindAllAuthorsError(#[from] pub anyhow::Error);

/// Field changes for an existing author. Unset fields keep their stored value.
#[derive(Debug)]
pub struct UpdateAuthorRequest {
    id: i64,
    first_name: Option<RequiredText>,
    last_name: Option<RequiredText>,
    birth_date: Option<NaiveDate>,
}

impl UpdateAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            birth_date: None,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn first_name(&self) -> Option<&RequiredText> {
        self.first_name.as_ref()
    }

    pub fn set_first_name(&mut self, first_name: RequiredText) {
        self.first_name = Some(first_name);
    }

    pub const fn last_name(&self) -> Option<&RequiredText> {
        self.last_name.as_ref()
    }

    pub fn set_last_name(&mut self, last_name: RequiredText) {
        self.last_name = Some(last_name);
    }

    pub const fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn set_birth_date(&mut self, birth_date: NaiveDate) {
        self.birth_date = Some(birth_date);
    }

    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.birth_date.is_none()
    }
}

#[derive(Error, Debug)]
pub enum UpdateAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct DeleteAuthorRequest {
    id: i64,
}

impl DeleteAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum DeleteAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct CreateBookRequest {
    title: RequiredText,
    author_id: i64,
    description: Option<String>,
    pub_date: NaiveDate,
}

impl CreateBookRequest {
    pub const fn new(
        title: RequiredText,
        author_id: i64,
        description: Option<String>,
        pub_date: NaiveDate,
    ) -> Self {
        Self {
            title,
            author_id,
            description,
            pub_date,
        }
    }

    pub const fn title(&self) -> &RequiredText {
        &self.title
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub const fn pub_date(&self) -> NaiveDate {
        self.pub_date
    }
}

#[derive(Error, Debug)]
pub enum CreateBookError {
    #[error("Author with id \"{author_id}\" does not exist")]
    AuthorNotFound { author_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct FindBookRequest {
    id: i64,
}

impl FindBookRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum FindBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindAllBooksError(#[from] pub anyhow::Error);

/// Field changes for an existing book. Unset fields keep their stored value;
/// `description` distinguishes "leave alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug)]
pub struct UpdateBookRequest {
    id: i64,
    title: Option<RequiredText>,
    author_id: Option<i64>,
    description: Option<Option<String>>,
    pub_date: Option<NaiveDate>,
}

impl UpdateBookRequest {
    pub const fn new(id: i64) -> Self {
        Self {
            id,
            title: None,
            author_id: None,
            description: None,
            pub_date: None,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> Option<&RequiredText> {
        self.title.as_ref()
    }

    pub fn set_title(&mut self, title: RequiredText) {
        self.title = Some(title);
    }

    pub const fn author_id(&self) -> Option<i64> {
        self.author_id
    }

    pub fn set_author_id(&mut self, author_id: i64) {
        self.author_id = Some(author_id);
    }

    pub fn description(&self) -> Option<Option<&str>> {
        self.description.as_ref().map(Option::as_deref)
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = Some(description);
    }

    pub const fn pub_date(&self) -> Option<NaiveDate> {
        self.pub_date
    }

    pub fn set_pub_date(&mut self, pub_date: NaiveDate) {
        self.pub_date = Some(pub_date);
    }

    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author_id.is_none()
            && self.description.is_none()
            && self.pub_date.is_none()
    }
}

#[derive(Error, Debug)]
pub enum UpdateBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error("Author with id \"{author_id}\" does not exist")]
    AuthorNotFound { author_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct DeleteBookRequest {
    id: i64,
}

impl DeleteBookRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum DeleteBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: i64,
    username: String,
}

impl Principal {
    pub const fn new(id: i64, username: String) -> Self {
        Self { id, username }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    key: String,
    account_id: i64,
    created: DateTime<Utc>,
}

impl Token {
    pub const fn new(key: String, account_id: i64, created: DateTime<Utc>) -> Self {
        Self {
            key,
            account_id,
            created,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn account_id(&self) -> i64 {
        self.account_id
    }

    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub const fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct CreateUserRequest {
    credentials: Credentials,
}

impl CreateUserRequest {
    pub const fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    pub fn password(&self) -> &str {
        self.credentials.password()
    }
}

#[derive(Error, Debug)]
pub enum CreateUserError {
    #[error("User with username \"{username}\" already exists")]
    Duplicate { username: String },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum VerifyCredentialsError {
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum IssueTokenError {
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<VerifyCredentialsError> for IssueTokenError {
    fn from(err: VerifyCredentialsError) -> Self {
        match err {
            VerifyCredentialsError::InvalidCredentials => Self::InvalidCredentials,
            VerifyCredentialsError::Other(err) => Self::Other(err),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveTokenError {
    #[error("Invalid token.")]
    InvalidToken,
    #[error("User inactive or deleted.")]
    Inactive,
    #[error(transparent)]
    Other(anyhow::Error),
}
