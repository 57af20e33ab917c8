mod authors;
mod books;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod serializers;
mod token;

use crate::auth::TokenStore;
use crate::repositories::{AuthorRepository, BookRepository};
use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    authors: Arc<dyn AuthorRepository>,
    books: Arc<dyn BookRepository>,
    tokens: TokenStore,
}

impl AppState {
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        books: Arc<dyn BookRepository>,
        tokens: TokenStore,
    ) -> Self {
        Self {
            authors,
            books,
            tokens,
        }
    }

    pub fn authors(&self) -> &dyn AuthorRepository {
        self.authors.as_ref()
    }

    pub fn books(&self) -> &dyn BookRepository {
        self.books.as_ref()
    }

    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(state: AppState, config: HttpServerConfig) -> anyhow::Result<Self> {
        let router = router(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self
            .listener
            .local_addr()
            .context("Failed to read listener address")?;
        tracing::info!(%addr, "listening");

        axum::serve(self.listener, self.router)
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

/// The full application: format-suffix rewriting in front of the `/api` routes.
pub fn router(state: AppState) -> Router {
    let api = Router::new().nest("/api", api_routes(state));
    let rewritten = axum::middleware::from_fn(middleware::strip_format_suffix).layer(api);

    Router::new()
        .fallback_service(rewritten)
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(resource_routes(state.clone()))
        .route("/token/", post(token::obtain_token))
        .with_state(state)
}

/// Every route here requires a valid token.
fn resource_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/authors/",
            get(authors::list_authors).post(authors::create_author),
        )
        .route(
            "/authors/{id}/",
            get(authors::retrieve_author)
                .put(authors::replace_author)
                .patch(authors::partial_update_author)
                .delete(authors::delete_author),
        )
        .route("/books/", get(books::list_books).post(books::create_book))
        .route(
            "/books/{id}/",
            get(books::retrieve_book)
                .put(books::replace_book)
                .patch(books::partial_update_book)
                .delete(books::delete_book),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_token,
        ))
}
