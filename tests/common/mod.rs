#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use library_api::auth::TokenStore;
use library_api::database::{
    DefaultAuthorRepository, DefaultBookRepository, DefaultTokenRepository,
    DefaultUserRepository, establish_pool,
};
use library_api::http::{AppState, router};
use library_api::models::{CreateUserRequest, Credentials};
use library_api::repositories::UserRepository;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const USERNAME: &str = "testuser";
pub const PASSWORD: &str = "testpass";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub token: String,
    _dir: TempDir,
}

impl TestApp {
    /// Fresh database with one account and its token already issued.
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let url = format!("sqlite://{}", dir.path().join("library.db").display());
        let pool = establish_pool(&url).await.expect("Should open test database");

        let users = DefaultUserRepository::new(pool.clone(), 4);
        users
            .create_user(&CreateUserRequest::new(Credentials::new(
                USERNAME.into(),
                PASSWORD.into(),
            )))
            .await
            .expect("Should create test user");

        let tokens = TokenStore::new(
            Arc::new(users),
            Arc::new(DefaultTokenRepository::new(pool.clone())),
        );
        let token = tokens
            .issue(&Credentials::new(USERNAME.into(), PASSWORD.into()))
            .await
            .expect("Should issue token")
            .key()
            .to_owned();

        let state = AppState::new(
            Arc::new(DefaultAuthorRepository::new(pool.clone())),
            Arc::new(DefaultBookRepository::new(pool.clone())),
            tokens,
        );

        Self {
            router: router(state),
            pool,
            token,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router should not fail");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        (status, body)
    }

    /// Request carrying the test account's token.
    pub async fn authed(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let auth = format!("Token {}", self.token);
        self.send(json_request(method, uri, Some(&auth), body)).await
    }

    pub async fn anonymous(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(json_request(method, uri, None, body)).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Should count rows")
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn form_request(uri: &str, authorization: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}
