use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use archives_backend::server::router::router;
use archives_backend::state::AppState;
use archives_backend::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let state = AppState::initialize();

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(8000);
    let bind_addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
