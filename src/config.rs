use std::env;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use url::Url;

/// Scopes requested during authorization.
pub const SCOPES: &str = "user-top-read user-read-private user-read-email playlist-modify-private user-library-read playlist-read-private";

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Application configuration from environment variables.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: Url,
    pub spotify_accounts_url: Url,
    pub spotify_api_base: Url,
    pub scope: String,
    pub http_timeout: Duration,
    pub cookie_key: Key,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} is required"))
        };
        let parse_url = |key: &str, raw: String| -> anyhow::Result<Url> {
            raw.parse()
                .map_err(|e| anyhow::anyhow!("{key} is not a valid URL: {e}"))
        };

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let spotify_client_id = required("SPOTIFY_CLIENT_ID")?;
        let spotify_client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let spotify_redirect_uri =
            parse_url("SPOTIFY_REDIRECT_URI", required("SPOTIFY_REDIRECT_URI")?)?;

        let mut spotify_accounts_url = parse_url(
            "SPOTIFY_ACCOUNTS_URL",
            lookup("SPOTIFY_ACCOUNTS_URL").unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.into()),
        )?;
        // Endpoint paths are joined onto this base, which needs a trailing slash.
        if !spotify_accounts_url.path().ends_with('/') {
            let path = format!("{}/", spotify_accounts_url.path());
            spotify_accounts_url.set_path(&path);
        }
        let spotify_api_base = parse_url(
            "SPOTIFY_API_BASE",
            lookup("SPOTIFY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into()),
        )?;

        let http_timeout = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        // Without a configured secret every restart invalidates existing cookies.
        let cookie_key = match lookup("SESSION_SECRET") {
            Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
                anyhow::anyhow!("SESSION_SECRET must be at least 64 bytes long")
            })?,
            None => Key::generate(),
        };

        Ok(Self {
            port,
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            spotify_accounts_url,
            spotify_api_base,
            scope: SCOPES.to_string(),
            http_timeout,
            cookie_key,
        })
    }
}
