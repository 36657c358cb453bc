//! Authorization-code flow against the Spotify accounts service.

use std::time::{Duration, Instant};

use base64::Engine;
use serde::Deserialize;
use url::Url;

use super::{ApiError, SpotifyClient};
use crate::config::Config;

/// Tokens are treated as expired this long before the server says so.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token exchange failed: {0}")]
    Exchange(#[source] ApiError),
    #[error("could not resolve current user: {0}")]
    Identity(#[source] ApiError),
}

/// Credentials of one authenticated user.
#[derive(Clone, Debug)]
pub struct TokenInfo {
    pub access_token: String,
    pub scope: String,
    pub refresh_token: Option<String>,
    pub expires_at: Instant,
}

impl TokenInfo {
    pub fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }

    fn from_response(body: TokenResponse, previous_refresh: Option<String>) -> Self {
        Self {
            access_token: body.access_token,
            scope: body.scope,
            refresh_token: body.refresh_token.or(previous_refresh),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    scope: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> u64 { 3600 }

/// Builds authorization URLs, trades codes for tokens and identifies their owner.
pub struct SpotifyAuth {
    api: SpotifyClient,
    client_id: String,
    client_secret: String,
    redirect_uri: Url,
    scope: String,
    authorize_url: Url,
    token_url: Url,
}

impl SpotifyAuth {
    pub fn new(config: &Config, api: SpotifyClient) -> anyhow::Result<Self> {
        let accounts = &config.spotify_accounts_url;
        Ok(Self {
            api,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
            scope: config.scope.clone(),
            authorize_url: accounts.join("authorize")?,
            token_url: accounts.join("api/token")?,
        })
    }

    /// URL the browser is sent to for consent.
    pub fn authorization_url(&self) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("scope", &self.scope);
        url
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let body = self
            .request_token("token exchange", &params)
            .await
            .map_err(AuthError::Exchange)?;
        Ok(TokenInfo::from_response(body, None))
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh(&self, token: &TokenInfo) -> Result<TokenInfo, AuthError> {
        let Some(refresh_token) = token.refresh_token.as_deref() else {
            return Ok(token.clone());
        };
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let body = self
            .request_token("token refresh", &params)
            .await
            .map_err(AuthError::Exchange)?;
        Ok(TokenInfo::from_response(body, token.refresh_token.clone()))
    }

    /// Id of the account that owns `token`.
    pub async fn resolve_current_user(&self, token: &TokenInfo) -> Result<String, AuthError> {
        let profile = self
            .api
            .current_user(&token.access_token)
            .await
            .map_err(AuthError::Identity)?;
        Ok(profile.id)
    }

    async fn request_token(
        &self,
        operation: &'static str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, ApiError> {
        let auth = base64::engine::general_purpose::STANDARD.encode(
            format!("{}:{}", self.client_id, self.client_secret).as_bytes(),
        );

        let res = self
            .api
            .http()
            .post(self.token_url.clone())
            .header("Authorization", format!("Basic {}", auth))
            .form(params)
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status { operation, status, body });
        }

        res.json()
            .await
            .map_err(|source| ApiError::Decode { operation, source })
    }
}
