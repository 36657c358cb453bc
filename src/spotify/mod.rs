//! Spotify Web API client.
//!
//! Every call is made on behalf of a logged-in user, so the access token is
//! passed per request instead of being cached on the client.

pub mod auth;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::mood::MoodProfile;

pub const TOP_ITEMS_TIME_RANGE: &str = "medium_term";

/// Failure talking to the Spotify API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Spotify API error during {operation}: {status} - {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation} parse failed: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Catalog kinds accepted by the search endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchKind {
    Artist,
    Track,
}

impl SearchKind {
    /// Anything other than `artist` searches tracks.
    pub fn from_form(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("artist") => Self::Artist,
            _ => Self::Track,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Track => "track",
        }
    }
}

/// Spotify API client bound to one API base URL.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(api_base: &Url, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(client, api_base))
    }

    pub fn with_http_client(client: Client, api_base: &Url) -> Self {
        Self {
            client,
            api_base: api_base.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.api_base, path);

        let res = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
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

    /// GET /me - profile of the token's owner.
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get_json("current user", token, "/me", &[]).await
    }

    /// The user's most listened artists.
    pub async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<Artist>, ApiError> {
        let page: Page<Artist> = self
            .get_json(
                "top artists",
                token,
                "/me/top/artists",
                &[
                    ("limit", limit.to_string()),
                    ("time_range", TOP_ITEMS_TIME_RANGE.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    /// The user's most listened tracks.
    pub async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<Track>, ApiError> {
        let page: Page<Track> = self
            .get_json(
                "top tracks",
                token,
                "/me/top/tracks",
                &[
                    ("limit", limit.to_string()),
                    ("time_range", TOP_ITEMS_TIME_RANGE.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    /// Recommendations seeded by up to 5 tracks and biased toward a mood's targets.
    pub async fn recommendations(
        &self,
        token: &str,
        seed_tracks: &[String],
        profile: &MoodProfile,
        limit: u32,
    ) -> Result<Vec<Track>, ApiError> {
        let seeds: Vec<_> = seed_tracks.iter().take(5).cloned().collect();

        let mut query = vec![
            ("seed_tracks", seeds.join(",")),
            ("limit", limit.to_string()),
        ];
        query.extend(
            profile
                .query_params()
                .into_iter()
                .map(|(key, value)| (key, value.to_string())),
        );

        let body: RecommendationsResponse = self
            .get_json("recommendations", token, "/recommendations", &query)
            .await?;
        Ok(body.tracks)
    }

    /// Search the catalog for artists or tracks.
    pub async fn search(
        &self,
        token: &str,
        q: &str,
        kind: SearchKind,
        limit: u32,
    ) -> Result<SearchResults, ApiError> {
        let query = [
            ("q", q.to_string()),
            ("type", kind.as_str().to_string()),
            ("limit", limit.clamp(1, 50).to_string()),
        ];

        let body: SearchResponse = self.get_json("search", token, "/search", &query).await?;
        Ok(SearchResults {
            artists: body.artists.map(|p| p.items).unwrap_or_default(),
            tracks: body.tracks.map(|p| p.items).unwrap_or_default(),
        })
    }
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Deserialize)]
struct SearchResponse {
    artists: Option<Page<Artist>>,
    tracks: Option<Page<Track>>,
}

/// Matches of a catalog search; only the searched kind is populated.
#[derive(Debug, Default)]
pub struct SearchResults {
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
}

/// Profile of the authenticated account.
#[derive(Clone, Debug, Deserialize)]
pub struct UserProfile {
    pub id: String,
}

/// A full artist object, as returned by top-items and search.
#[derive(Clone, Debug, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// A Spotify track (simplified).
#[derive(Clone, Debug, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl Track {
    /// Name of the first credited artist, if any.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }
}

/// Artist as embedded in track objects.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct ArtistRef {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_kind_from_form() {
        assert_eq!(SearchKind::from_form(Some("artist")), SearchKind::Artist);
        assert_eq!(SearchKind::from_form(Some(" Artist ")), SearchKind::Artist);
        assert_eq!(SearchKind::from_form(Some("track")), SearchKind::Track);
        assert_eq!(SearchKind::from_form(Some("album")), SearchKind::Track);
        assert_eq!(SearchKind::from_form(None), SearchKind::Track);
    }

    #[test]
    fn test_search_response_parses_only_requested_kind() {
        let raw = r#"{"artists":{"items":[{"id":"a1","name":"Muse","genres":["rock"]}]}}"#;
        let body: SearchResponse = serde_json::from_str(raw).unwrap();

        assert!(body.tracks.is_none());
        let artists = body.artists.unwrap().items;
        assert_eq!(artists[0].name, "Muse");
        assert_eq!(artists[0].genres, vec!["rock"]);
    }

    #[test]
    fn test_track_artists_are_optional() {
        let raw = r#"{"id":"t1","name":"Song","artists":[{"id":null,"name":"Band"}]}"#;
        let track: Track = serde_json::from_str(raw).unwrap();

        assert_eq!(track.primary_artist(), Some("Band"));

        let bare: Track = serde_json::from_str(r#"{"id":"t2","name":"Solo"}"#).unwrap();
        assert_eq!(bare.primary_artist(), None);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let base: Url = "http://localhost:4000/v1/".parse().unwrap();
        let client = SpotifyClient::with_http_client(Client::new(), &base);
        assert_eq!(client.api_base, "http://localhost:4000/v1");
    }
}
