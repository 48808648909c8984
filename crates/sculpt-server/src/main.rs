//! HTTP server for the sculpt text-to-3D pipeline
//!
//! Exposes the generation pipeline to an external application backend:
//! `/generate` for the full prompt-to-3D run, `/generate/image` and
//! `/generate/3d` for the individual stages, and `/files` for artifact
//! downloads.

mod error;
mod routes;
mod schemas;
mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sculpt_gen::SculptConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Reference image uploads can be a few megabytes of PNG
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = SculptConfig::load()?;
    let output_dir =
        std::env::var("SCULPT_OUTPUT_DIR").unwrap_or_else(|_| "outputs".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("PORT must be a number"))?;

    let state = AppState::new(config, &output_dir)?;

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/generate", post(routes::generate))
        .route("/generate/image", post(routes::generate_image))
        .route("/generate/3d", post(routes::generate_3d))
        .route("/files/{*path}", get(routes::serve_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}, output dir {:?}", addr, output_dir);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
