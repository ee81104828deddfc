//! inkdraft API server
//!
//! Serves posts, accounts and AI rewrites over a SQLite database.
//!
//! # Configuration
//!
//! Environment variables:
//! - `INKDRAFT_PORT`: Port to listen on (default: 8080)
//! - `INKDRAFT_DATABASE_PATH`: SQLite file (default: ~/.local/share/inkdraft-server/inkdraft.db)
//! - `INKDRAFT_TOKEN_TTL_MINUTES`: Bearer token lifetime (default: 1440)
//! - `INKDRAFT_CORS_ORIGINS`: Comma-separated allowed origins
//! - `GEMINI_API_KEY`: Enables AI rewrites
//! - `GEMINI_MODEL`: Model used for AI rewrites
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `/api/auth/*`: signup, login, current user
//! - `/api/posts/*`: post CRUD and publishing
//! - `POST /api/ai/generate`: summary, fix_grammar, expand

mod config;
mod db;
mod server;

use chrono::Utc;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use db::{init_db, UserRepository};
use server::{ai::AiClient, router, AppState};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkdraft_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    tracing::info!("Database: {}", config.database_path.display());
    let pool = init_db(&config.database_path).await?;

    let ai = AiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone());
    if ai.is_enabled() {
        tracing::info!("AI rewrites enabled (model: {})", config.gemini_model);
    } else {
        tracing::warn!("GEMINI_API_KEY not set, AI rewrites return placeholders");
    }

    spawn_session_sweeper(UserRepository::new(pool.clone()));

    let state = AppState::new(
        pool,
        ai,
        chrono::Duration::minutes(config.token_ttl_minutes),
    );
    let app = router(state, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Deletes expired sessions now and then every hour.
fn spawn_session_sweeper(users: UserRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match users.delete_expired_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!("Removed {} expired session(s)", removed),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });
}
