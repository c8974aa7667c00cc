use std::net::SocketAddr;

use anyhow::Context;
use coachline_api::{app, AppState, AuthConfig};
use coachline_catalog::CatalogRules;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachline_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = coachline_store::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Coachline API on port {}", config.server.port);

    let store = coachline_store::open_store(&config.store)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open document store: {}", e))?;

    let app_state = AppState::new(
        store,
        AuthConfig { secret: config.auth.jwt_secret.clone() },
        CatalogRules { adult_age: config.booking.adult_age },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
