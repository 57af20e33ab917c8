mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp, USERNAME};
use serde_json::json;

#[tokio::test]
async fn exchange_returns_the_accounts_token() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .anonymous(
            "POST",
            "/api/token/",
            Some(json!({ "username": USERNAME, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "token": app.token }));
}

#[tokio::test]
async fn exchange_accepts_form_bodies() {
    let app = TestApp::spawn().await;
    let body = format!("username={USERNAME}&password={PASSWORD}");

    let (status, body) = app
        .send(common::form_request("/api/token/", None, &body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], json!(app.token));
}

#[tokio::test]
async fn wrong_password_is_bad_request() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .anonymous(
            "POST",
            "/api/token/",
            Some(json!({ "username": USERNAME, "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "non_field_errors": ["Unable to log in with provided credentials."] })
    );
}

#[tokio::test]
async fn missing_credentials_are_field_errors() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .anonymous("POST", "/api/token/", Some(json!({ "username": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "password": ["This field is required."],
            "username": ["This field may not be blank."],
        })
    );
}

#[tokio::test]
async fn issued_token_authenticates_requests() {
    let app = TestApp::spawn().await;
    let (_, body) = app
        .anonymous(
            "POST",
            "/api/token.json",
            Some(json!({ "username": USERNAME, "password": PASSWORD })),
        )
        .await;
    let auth = format!("Token {}", body["token"].as_str().unwrap());

    let (status, _) = app
        .send(common::json_request("GET", "/api/books/", Some(&auth), None))
        .await;
    assert_eq!(status, StatusCode::OK);
}
