mod config;
mod error;
mod genres;
mod handlers;
mod mood;
mod session;
mod spotify;
mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handlers::{router, AppState};
use crate::session::SessionRegistry;
use crate::spotify::auth::SpotifyAuth;
use crate::spotify::SpotifyClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_path = dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(
            "{e}. Set SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET and SPOTIFY_REDIRECT_URI before starting."
        );
    })?;

    let spotify = SpotifyClient::new(&config.spotify_api_base, config.http_timeout)?;
    let auth = SpotifyAuth::new(&config, spotify.clone())?;

    let state = AppState {
        auth: Arc::new(auth),
        spotify,
        sessions: SessionRegistry::new(),
        cookie_key: config.cookie_key.clone(),
    };

    let app = router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
