//! Collaborator interfaces consumed by the bangumi service.
//!
//! The Bilibili client implements both traits; tests substitute in-memory
//! fakes so the service can be exercised without a network.

use std::future::Future;

use hikari_core::models::{Season, StreamInfo};

/// Source of season metadata.
pub trait MetadataSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a season by its season id.
    fn season_by_id(
        &self,
        season_id: i64,
    ) -> impl Future<Output = Result<Season, Self::Error>> + Send;

    /// Fetch the season that contains the given episode.
    fn season_by_episode_id(
        &self,
        episode_id: i64,
    ) -> impl Future<Output = Result<Season, Self::Error>> + Send;

    /// Fetch a media entry, which carries the id of its season.
    fn media_by_id(
        &self,
        media_id: i64,
    ) -> impl Future<Output = Result<MediaInfo, Self::Error>> + Send;
}

/// Resolver of playable stream metadata for one page.
pub trait StreamResolver: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn resolve_play_url(
        &self,
        avid: i64,
        bvid: &str,
        cid: i64,
    ) -> impl Future<Output = Result<StreamInfo, Self::Error>> + Send;
}

/// A media entry (`md<id>`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaInfo {
    pub media_id: i64,
    pub season_id: i64,
    pub title: String,
}
