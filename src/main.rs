use anyhow::Context;
use clap::{Parser, Subcommand};
use library_api::auth::TokenStore;
use library_api::config::Config;
use library_api::database::{
    DefaultAuthorRepository, DefaultBookRepository, DefaultTokenRepository,
    DefaultUserRepository, establish_pool,
};
use library_api::http::{AppState, HttpServer, HttpServerConfig};
use library_api::models::{CreateUserRequest, Credentials};
use library_api::repositories::UserRepository;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Authors and books over an authenticated JSON API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create an account that can exchange its credentials for a token
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, env = "LIBRARY_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = establish_pool(config.database_url()).await?;
    let users = DefaultUserRepository::new(pool.clone(), config.password_hash_cost());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let tokens = TokenStore::new(
                Arc::new(users),
                Arc::new(DefaultTokenRepository::new(pool.clone())),
            );
            let state = AppState::new(
                Arc::new(DefaultAuthorRepository::new(pool.clone())),
                Arc::new(DefaultBookRepository::new(pool)),
                tokens,
            );
            let server_config = HttpServerConfig::new(config.server_port());
            let http_server = HttpServer::new(state, server_config).await?;
            http_server.run().await
        }
        Command::CreateUser { username, password } => {
            let req = CreateUserRequest::new(Credentials::new(username, password));
            let principal = users
                .create_user(&req)
                .await
                .context("Failed to create user")?;
            tracing::info!(id = principal.id(), username = principal.username(), "user created");
            Ok(())
        }
    }
}
