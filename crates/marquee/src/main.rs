use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use marquee_core::config::FeedConfig;
use marquee_core::db;
use marquee_core::engine::SyncEngine;
use marquee_core::fetch::{FeedSource, HttpFeedSource};
use marquee_core::store::PgBookingStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Marquee feed reconciliation service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server exposing the sync trigger
    Serve(ServeArgs),
    /// Run one reconciliation pass and print the report
    Sync,
    /// Run database migrations
    Migrate,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Sync => {
            let engine = build_engine().await?;
            let report = engine.sync().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Migrate => {
            let pool = connect_pool().await?;
            db::run_migrations(&pool).await?;
            info!("database migrations applied");
            Ok(())
        }
    }
}

async fn connect_pool() -> Result<db::DbPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("MARQUEE_DATABASE_URL"))
        .context("DATABASE_URL (or MARQUEE_DATABASE_URL) must be set")?;
    db::connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn build_engine() -> Result<SyncEngine> {
    dotenvy::dotenv().ok();
    let config = FeedConfig::from_env()?;
    let pool = connect_pool().await?;

    let source: Option<Arc<dyn FeedSource>> = match config.source_url.as_deref() {
        Some(url) => Some(Arc::new(
            HttpFeedSource::new(url, config.fetch_timeout)
                .context("failed to build HTTP feed source")?,
        )),
        None => None,
    };

    Ok(SyncEngine::new(
        source,
        Arc::new(PgBookingStore::new(pool)),
        &config,
    ))
}

async fn serve(args: ServeArgs) -> Result<()> {
    let engine = Arc::new(build_engine().await?);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/sync", post(trigger_sync))
        .with_state(engine);

    info!(bind = %args.bind, "marquee server listening");
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn trigger_sync(State(engine): State<Arc<SyncEngine>>) -> Response {
    match engine.sync().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => {
            error!(error = %err, "sync run failed");
            let body = serde_json::json!({ "error": err.to_string() });
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}
