//! HTTP handlers for the dashboard.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query, State},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::Deserialize;

use crate::error::AppError;
use crate::genres;
use crate::mood::{self, MoodProfile};
use crate::session::{SessionRegistry, TagError};
use crate::spotify::auth::{SpotifyAuth, TokenInfo};
use crate::spotify::{ApiError, SearchKind, SearchResults, SpotifyClient, Track};
use crate::views::{self, DashboardView, PlaylistView, SearchView};

pub const SESSION_COOKIE: &str = "pimusic_session";

const TOP_ARTISTS_LIMIT: u32 = 10;
const SEED_TRACKS_LIMIT: u32 = 5;
const RECOMMENDATIONS_LIMIT: u32 = 20;
const SEARCH_LIMIT: u32 = 15;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<SpotifyAuth>,
    pub spotify: SpotifyClient,
    pub sessions: SessionRegistry,
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    /// Refresh `token` if it has expired and can be refreshed. Falls back to the stale token.
    async fn fresh_token(&self, user_id: &str, token: TokenInfo) -> TokenInfo {
        if !token.is_expired() || token.refresh_token.is_none() {
            return token;
        }
        match self.auth.refresh(&token).await {
            Ok(refreshed) => {
                tracing::debug!(user_id = %user_id, "access token refreshed");
                self.sessions.put(user_id, refreshed.clone()).await;
                refreshed
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "token refresh failed");
                token
            }
        }
    }
}

/// User id carried by the signed session cookie, if any.
fn session_user(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| !id.is_empty())
}

fn session_cookie(user_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, user_id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Logged-in user whose session resolves in the registry.
///
/// Requests without one are redirected to `/` before the handler runs.
pub struct CurrentUser {
    pub user_id: String,
    pub token: TokenInfo,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        let user_id = session_user(&jar).ok_or_else(|| Redirect::to("/"))?;
        let token = state
            .sessions
            .get(&user_id)
            .await
            .ok_or_else(|| Redirect::to("/"))?;
        let token = state.fresh_token(&user_id, token).await;

        Ok(Self { user_id, token })
    }
}

/// Log an API failure and carry on with empty data.
fn or_empty<T: Default>(result: Result<T, ApiError>, user_id: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(user_id = %user_id, error = %e, "Spotify request failed");
        T::default()
    })
}

/// GET /health - Health check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET / - landing page, or the dashboard for logged-in users.
pub async fn index(user: Option<CurrentUser>) -> Response {
    match user {
        Some(_) => Redirect::to("/dashboard").into_response(),
        None => Html(views::landing()).into_response(),
    }
}

/// GET /login - send the browser to Spotify's consent page.
pub async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::to(state.auth.authorization_url().as_str())
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /callback - finish the authorization-code flow.
pub async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(SignedCookieJar, Redirect), AppError> {
    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "authorization denied by Spotify");
    }

    let code = params.code.filter(|c| !c.is_empty()).ok_or_else(|| {
        AppError::BadRequest(
            "No authorization code received. Check that the redirect URI matches.".into(),
        )
    })?;

    let token = state.auth.exchange_code(&code).await?;
    let user_id = state.auth.resolve_current_user(&token).await?;
    tracing::info!(user_id = %user_id, scope = %token.scope, "login successful");
    state.sessions.put(&user_id, token).await;

    Ok((jar.add(session_cookie(user_id)), Redirect::to("/dashboard")))
}

/// GET /logout - forget the session cookie.
pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

/// GET /dashboard - top artists, genre chart and tagged songs.
pub async fn dashboard(State(state): State<AppState>, user: CurrentUser) -> Html<String> {
    let top_artists = or_empty(
        state
            .spotify
            .top_artists(&user.token.access_token, TOP_ARTISTS_LIMIT)
            .await,
        &user.user_id,
    );
    let genres = genres::histogram(&top_artists);
    let tags = state.sessions.get_tags(&user.user_id).await;

    Html(views::dashboard(&DashboardView {
        title: "Dashboard".into(),
        top_artists,
        genres,
        tags,
        ..Default::default()
    }))
}

#[derive(Debug, Deserialize)]
pub struct PlaylistParams {
    pub mood: Option<String>,
}

async fn recommend(
    spotify: &SpotifyClient,
    token: &str,
    profile: &MoodProfile,
) -> Result<Vec<Track>, ApiError> {
    let seeds: Vec<String> = spotify
        .top_tracks(token, SEED_TRACKS_LIMIT)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    if seeds.is_empty() {
        tracing::debug!("no top tracks to seed recommendations");
        return Ok(vec![]);
    }

    spotify
        .recommendations(token, &seeds, profile, RECOMMENDATIONS_LIMIT)
        .await
}

/// GET /playlist - recommendations for a mood, seeded by the user's top tracks.
pub async fn playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PlaylistParams>,
) -> Html<String> {
    let mood = mood::resolve(params.mood.as_deref());
    let profile = mood.profile();
    tracing::debug!(mood = %mood, ?profile, "generating playlist");

    let tracks = or_empty(
        recommend(&state.spotify, &user.token.access_token, &profile).await,
        &user.user_id,
    );
    let tags = state.sessions.get_tags(&user.user_id).await;

    let title = format!("Playlist {}", mood.label());
    Html(views::dashboard(&DashboardView {
        title,
        playlist: Some(PlaylistView { mood, tracks }),
        tags,
        ..Default::default()
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// POST /search - look up artists or tracks.
pub async fn search(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<SearchForm>,
) -> Html<String> {
    let query = form.query.unwrap_or_default().trim().to_string();
    let kind = SearchKind::from_form(form.kind.as_deref());

    let results = if query.is_empty() {
        SearchResults::default()
    } else {
        or_empty(
            state
                .spotify
                .search(&user.token.access_token, &query, kind, SEARCH_LIMIT)
                .await,
            &user.user_id,
        )
    };
    let tags = state.sessions.get_tags(&user.user_id).await;

    Html(views::dashboard(&DashboardView {
        title: "Search".into(),
        search: Some(SearchView {
            query,
            kind,
            artists: results.artists,
            tracks: results.tracks,
        }),
        tags,
        ..Default::default()
    }))
}

#[derive(Debug, Deserialize)]
pub struct TagForm {
    pub song_id: Option<String>,
    pub song_name: Option<String>,
    pub tag: Option<String>,
}

/// POST /tag_song - attach a free-text tag to a track for the session's user.
pub async fn tag_song(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<TagForm>,
) -> Result<Redirect, AppError> {
    let user_id = session_user(&jar).ok_or(TagError::MissingIdentity)?;
    if state.sessions.get(&user_id).await.is_none() {
        return Err(TagError::MissingIdentity.into());
    }
    let field = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").to_string();

    state
        .sessions
        .tag_song(&user_id, &field(&form.song_id), &field(&form.song_name), &field(&form.tag))
        .await?;

    Ok(Redirect::to("/dashboard"))
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout))
        .route("/dashboard", get(dashboard))
        .route("/playlist", get(playlist))
        .route("/search", post(search))
        .route("/tag_song", post(tag_song))
}
