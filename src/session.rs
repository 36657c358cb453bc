//! In-memory registry of logged-in users and the songs they tagged.
//!
//! State lives for the lifetime of the process; nothing is evicted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::spotify::auth::TokenInfo;

/// A free-text label a user attached to one track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongTag {
    pub song_id: String,
    pub name: String,
    pub tag: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TagError {
    #[error("no user in session")]
    MissingIdentity,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Default)]
struct Inner {
    tokens: HashMap<String, TokenInfo>,
    tags: HashMap<String, BTreeMap<String, SongTag>>,
}

/// Shared handle; clones refer to the same registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `token` for `user_id`, replacing any previous one.
    pub async fn put(&self, user_id: &str, token: TokenInfo) {
        self.inner
            .write()
            .await
            .tokens
            .insert(user_id.to_string(), token);
    }

    pub async fn get(&self, user_id: &str) -> Option<TokenInfo> {
        self.inner
            .read()
            .await
            .tokens
            .get(user_id)
            .filter(|t| !t.access_token.is_empty())
            .cloned()
    }

    pub async fn tag_song(
        &self,
        user_id: &str,
        song_id: &str,
        name: &str,
        tag: &str,
    ) -> Result<(), TagError> {
        if user_id.is_empty() {
            return Err(TagError::MissingIdentity);
        }
        if song_id.is_empty() {
            return Err(TagError::MissingField("song_id"));
        }
        if tag.is_empty() {
            return Err(TagError::MissingField("tag"));
        }

        let entry = SongTag {
            song_id: song_id.to_string(),
            name: name.to_string(),
            tag: tag.to_string(),
        };
        self.inner
            .write()
            .await
            .tags
            .entry(user_id.to_string())
            .or_default()
            .insert(song_id.to_string(), entry);
        Ok(())
    }

    /// Tags of `user_id` keyed by song id; empty when the user tagged nothing.
    pub async fn get_tags(&self, user_id: &str) -> BTreeMap<String, SongTag> {
        self.inner
            .read()
            .await
            .tags
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn token(access: &str) -> TokenInfo {
        TokenInfo {
            access_token: access.into(),
            scope: String::new(),
            refresh_token: Some("refresh".into()),
            expires_at: Instant::now() + Duration::from_secs(3600),
        }
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let registry = SessionRegistry::new();
        registry.put("alice", token("first")).await;
        registry.put("alice", token("second")).await;

        assert_eq!(registry.get("alice").await.unwrap().access_token, "second");
        assert!(registry.get("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_not_returned() {
        let registry = SessionRegistry::new();
        registry.put("alice", token("")).await;
        assert!(registry.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_tag_then_get() {
        let registry = SessionRegistry::new();
        registry.tag_song("alice", "t1", "Song One", "eutimia").await.unwrap();

        let tags = registry.get_tags("alice").await;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["t1"].name, "Song One");
        assert_eq!(tags["t1"].tag, "eutimia");
        assert!(registry.get_tags("bob").await.is_empty());
    }

    #[tokio::test]
    async fn test_retag_overwrites() {
        let registry = SessionRegistry::new();
        registry.tag_song("alice", "t1", "Song One", "old").await.unwrap();
        registry.tag_song("alice", "t1", "Song One", "new").await.unwrap();

        let tags = registry.get_tags("alice").await;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["t1"].tag, "new");
    }

    #[tokio::test]
    async fn test_tag_validation() {
        let registry = SessionRegistry::new();

        assert_eq!(
            registry.tag_song("", "t1", "n", "tag").await,
            Err(TagError::MissingIdentity)
        );
        assert_eq!(
            registry.tag_song("alice", "", "n", "tag").await,
            Err(TagError::MissingField("song_id"))
        );
        assert_eq!(
            registry.tag_song("alice", "t1", "n", "").await,
            Err(TagError::MissingField("tag"))
        );
        assert!(registry.get_tags("alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = SessionRegistry::new();
        let other = registry.clone();
        other.tag_song("alice", "t1", "", "x").await.unwrap();
        assert_eq!(registry.get_tags("alice").await.len(), 1);
    }
}
