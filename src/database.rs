use crate::models::{
    Author, Book, CreateAuthorError, CreateAuthorRequest, CreateBookError, CreateBookRequest,
    CreateUserError, CreateUserRequest, Credentials, DeleteAuthorError, DeleteAuthorRequest,
    DeleteBookError, DeleteBookRequest, FindAllAuthorsError, FindAllBooksError, FindAuthorError,
    FindAuthorRequest, FindBookError, FindBookRequest, IssueTokenError, Principal, RequiredText,
    ResolveTokenError, Token, UpdateAuthorError, UpdateAuthorRequest, UpdateBookError,
    UpdateBookRequest, VerifyCredentialsError,
};
use crate::repositories::{AuthorRepository, BookRepository, TokenRepository, UserRepository};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteRow};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!();

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, birth_date";
const BOOK_COLUMNS: &str = "id, title, author_id, description, pub_date";

/// Random bytes per token key; hex encoding doubles the length.
const TOKEN_KEY_BYTES: usize = 20;

pub async fn establish_pool(path: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(path)
        .with_context(|| format!("Invalid database path {path}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePool::connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;

    Ok(pool)
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let first_name = row.try_get("first_name")?;
        let last_name = row.try_get("last_name")?;
        let birth_date = row.try_get("birth_date")?;

        let first_name = RequiredText::new_unchecked(first_name);
        let last_name = RequiredText::new_unchecked(last_name);
        Ok(Self::new(id, first_name, last_name, birth_date))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let title = row.try_get("title")?;
        let author_id = row.try_get("author_id")?;
        let description = row.try_get("description")?;
        let pub_date = row.try_get("pub_date")?;

        let title = RequiredText::new_unchecked(title);
        Ok(Self::new(id, title, author_id, description, pub_date))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Principal {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let username = row.try_get("username")?;
        Ok(Self::new(id, username))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Token {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let key = row.try_get("key")?;
        let account_id = row.try_get("account_id")?;
        let created = row.try_get("created")?;
        Ok(Self::new(key, account_id, created))
    }
}

#[derive(Debug, Clone)]
pub struct DefaultAuthorRepository {
    pool: SqlitePool,
}

impl DefaultAuthorRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for DefaultAuthorRepository {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError> {
        let query = format!(
            "INSERT INTO author (first_name, last_name, birth_date) VALUES (?, ?, ?) RETURNING {AUTHOR_COLUMNS}"
        );
        let author = sqlx::query_as(&query)
            .bind(req.first_name().as_str())
            .bind(req.last_name().as_str())
            .bind(req.birth_date())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create author "{} {}""#,
                    req.first_name(),
                    req.last_name()
                ));
                CreateAuthorError(err)
            })?;

        Ok(author)
    }

    async fn find_author(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError> {
        let query = format!("SELECT {AUTHOR_COLUMNS} FROM author WHERE id = ?");
        let author = sqlx::query_as(&query)
            .bind(req.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if matches!(err, sqlx::Error::RowNotFound) {
                    FindAuthorError::NotFound { id: req.id() }
                } else {
                    let err = anyhow!(err).context(format!(
                        r#"Failed to retrieve author with id "{}""#,
                        req.id()
                    ));
                    FindAuthorError::Other(err)
                }
            })?;

        Ok(author)
    }

    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError> {
        let query = format!("SELECT {AUTHOR_COLUMNS} FROM author ORDER BY id");
        let authors = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context("Failed to retrieve all authors");
                FindAllAuthorsError(err)
            })?;

        Ok(authors)
    }

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError> {
        if req.is_empty() {
            return self
                .find_author(&FindAuthorRequest::new(req.id()))
                .await
                .map_err(|err| match err {
                    FindAuthorError::NotFound { id } => UpdateAuthorError::NotFound { id },
                    FindAuthorError::Other(err) => UpdateAuthorError::Other(err),
                });
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE author SET ");
        let mut parts = query.separated(", ");

        if let Some(first_name) = req.first_name() {
            parts.push("first_name = ");
            parts.push_bind_unseparated(first_name.as_str());
        }
        if let Some(last_name) = req.last_name() {
            parts.push("last_name = ");
            parts.push_bind_unseparated(last_name.as_str());
        }
        if let Some(birth_date) = req.birth_date() {
            parts.push("birth_date = ");
            parts.push_bind_unseparated(birth_date);
        }

        query
            .push(" WHERE id = ")
            .push_bind(req.id())
            .push(format!(" RETURNING {AUTHOR_COLUMNS}"));

        query
            .build_query_as::<Author>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to update author with id "{}""#, req.id()));
                UpdateAuthorError::Other(err)
            })?
            .ok_or(UpdateAuthorError::NotFound { id: req.id() })
    }

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError> {
        let result = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(req.id())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to delete author with id "{}""#, req.id()));
                DeleteAuthorError::Other(err)
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteAuthorError::NotFound { id: req.id() });
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DefaultBookRepository {
    pool: SqlitePool,
}

impl DefaultBookRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for DefaultBookRepository {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError> {
        let other = |err: sqlx::Error| {
            let err = anyhow!(err).context(format!(r#"Failed to create book "{}""#, req.title()));
            CreateBookError::Other(err)
        };

        // A single statement; the foreign key rejects a missing author atomically.
        let query = format!(
            "INSERT INTO book (title, author_id, description, pub_date) VALUES (?, ?, ?, ?) RETURNING {BOOK_COLUMNS}"
        );
        let book = sqlx::query_as(&query)
            .bind(req.title().as_str())
            .bind(req.author_id())
            .bind(req.description())
            .bind(req.pub_date())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    CreateBookError::AuthorNotFound {
                        author_id: req.author_id(),
                    }
                } else {
                    other(err)
                }
            })?;

        Ok(book)
    }

    async fn find_book(&self, req: &FindBookRequest) -> Result<Book, FindBookError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM book WHERE id = ?");
        let book = sqlx::query_as(&query)
            .bind(req.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if matches!(err, sqlx::Error::RowNotFound) {
                    FindBookError::NotFound { id: req.id() }
                } else {
                    let err = anyhow!(err)
                        .context(format!(r#"Failed to retrieve book with id "{}""#, req.id()));
                    FindBookError::Other(err)
                }
            })?;

        Ok(book)
    }

    async fn find_all_books(&self) -> Result<Vec<Book>, FindAllBooksError> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM book ORDER BY id");
        let books = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context("Failed to retrieve all books");
                FindAllBooksError(err)
            })?;

        Ok(books)
    }

    async fn update_book(&self, req: &UpdateBookRequest) -> Result<Book, UpdateBookError> {
        let other = |err: sqlx::Error| {
            let err =
                anyhow!(err).context(format!(r#"Failed to update book with id "{}""#, req.id()));
            UpdateBookError::Other(err)
        };

        let mut query = if req.is_empty() {
            QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM book WHERE id = "))
        } else {
            let mut query = QueryBuilder::<Sqlite>::new("UPDATE book SET ");
            let mut parts = query.separated(", ");

            if let Some(title) = req.title() {
                parts.push("title = ");
                parts.push_bind_unseparated(title.as_str());
            }
            if let Some(author_id) = req.author_id() {
                parts.push("author_id = ");
                parts.push_bind_unseparated(author_id);
            }
            if let Some(description) = req.description() {
                parts.push("description = ");
                parts.push_bind_unseparated(description);
            }
            if let Some(pub_date) = req.pub_date() {
                parts.push("pub_date = ");
                parts.push_bind_unseparated(pub_date);
            }

            query.push(" WHERE id = ");
            query
        };
        query.push_bind(req.id());
        if !req.is_empty() {
            query.push(format!(" RETURNING {BOOK_COLUMNS}"));
        }

        let book = query
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| match (is_foreign_key_violation(&err), req.author_id()) {
                (true, Some(author_id)) => UpdateBookError::AuthorNotFound { author_id },
                _ => other(err),
            })?
            .ok_or(UpdateBookError::NotFound { id: req.id() })?;

        Ok(book)
    }

    async fn delete_book(&self, req: &DeleteBookRequest) -> Result<(), DeleteBookError> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(req.id())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to delete book with id "{}""#, req.id()));
                DeleteBookError::Other(err)
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteBookError::NotFound { id: req.id() });
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DefaultUserRepository {
    pool: SqlitePool,
    hash_cost: u32,
}

impl DefaultUserRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool, hash_cost: u32) -> Self {
        Self { pool, hash_cost }
    }
}

#[async_trait]
impl UserRepository for DefaultUserRepository {
    async fn create_user(&self, req: &CreateUserRequest) -> Result<Principal, CreateUserError> {
        let password = req.password().to_owned();
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("Password hashing task panicked")
            .and_then(|hashed| hashed.context("Failed to hash password"))
            .map_err(CreateUserError::Other)?;

        let principal = sqlx::query_as(
            "INSERT INTO account (username, password_hash, is_active, created) VALUES (?, ?, TRUE, ?) RETURNING id, username",
        )
        .bind(req.username())
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CreateUserError::Duplicate {
                    username: req.username().to_string(),
                }
            } else {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create user with username "{}""#,
                    req.username()
                ));
                CreateUserError::Other(err)
            }
        })?;

        Ok(principal)
    }

    async fn verify_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, VerifyCredentialsError> {
        let account: Option<(i64, String, String, bool)> = sqlx::query_as(
            "SELECT id, username, password_hash, is_active FROM account WHERE username = ?",
        )
        .bind(credentials.username())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            let err = anyhow!(err).context(format!(
                r#"Failed to look up user with username "{}""#,
                credentials.username()
            ));
            VerifyCredentialsError::Other(err)
        })?;

        let Some((id, username, password_hash, is_active)) = account else {
            return Err(VerifyCredentialsError::InvalidCredentials);
        };

        let password = credentials.password().to_owned();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
            .await
            .context("Password verification task panicked")
            .and_then(|verified| verified.context("Stored password hash is malformed"))
            .map_err(VerifyCredentialsError::Other)?;

        if !matches || !is_active {
            return Err(VerifyCredentialsError::InvalidCredentials);
        }

        Ok(Principal::new(id, username))
    }
}

#[derive(Debug, Clone)]
pub struct DefaultTokenRepository {
    pool: SqlitePool,
}

impl DefaultTokenRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for DefaultTokenRepository {
    async fn find_or_create_token(&self, principal: &Principal) -> Result<Token, IssueTokenError> {
        let other = |err: sqlx::Error| {
            let err = anyhow!(err).context(format!(
                r#"Failed to issue token for user "{}""#,
                principal.username()
            ));
            IssueTokenError::Other(err)
        };

        sqlx::query(
            "INSERT INTO token (key, account_id, created) VALUES (?, ?, ?) ON CONFLICT (account_id) DO NOTHING",
        )
        .bind(generate_token_key())
        .bind(principal.id())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(other)?;

        let token = sqlx::query_as(
            "SELECT key, account_id, created FROM token WHERE account_id = ?",
        )
        .bind(principal.id())
        .fetch_one(&self.pool)
        .await
        .map_err(other)?;

        Ok(token)
    }

    async fn find_principal(&self, key: &str) -> Result<Principal, ResolveTokenError> {
        let account: Option<(i64, String, bool)> = sqlx::query_as(
            "SELECT account.id, account.username, account.is_active FROM token JOIN account ON account.id = token.account_id WHERE token.key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            let err = anyhow!(err).context("Failed to resolve token");
            ResolveTokenError::Other(err)
        })?;

        match account {
            None => Err(ResolveTokenError::InvalidToken),
            Some((_, _, false)) => Err(ResolveTokenError::Inactive),
            Some((id, username, true)) => Ok(Principal::new(id, username)),
        }
    }
}

fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_unique_violation();
    }

    false
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_foreign_key_violation();
    }

    false
}
