use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Episode id carried by pages built from a bangumi season.
pub const UNSET_EPISODE_ID: i64 = -1;

/// Duration shown until the stream info has been resolved.
pub const DURATION_PLACEHOLDER: &str = "N/A";

/// One displayable row of a page list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPage {
    pub avid: i64,
    pub bvid: String,
    pub cid: i64,
    pub episode_id: i64,
    /// 1-based position within its own list.
    pub order: usize,
    pub name: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamInfo>,
}

/// A node of the section tree shown next to the page list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSection {
    pub id: i64,
    pub title: String,
    pub is_selected: bool,
    pub pages: Vec<VideoPage>,
}

/// Playable stream metadata for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Quality id the server actually returned.
    pub quality: i32,
    pub duration_ms: u64,
    /// Every quality the server advertises for this page.
    pub qualities: Vec<StreamQuality>,
    pub video: Vec<MediaStream>,
    pub audio: Vec<MediaStream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamQuality {
    pub id: i32,
    pub description: String,
}

/// A single DASH (or legacy FLV/MP4 segment) stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStream {
    pub id: i32,
    pub base_url: String,
    pub backup_urls: Vec<String>,
    pub bandwidth: u64,
    pub codecs: String,
    pub width: u32,
    pub height: u32,
}

/// Decoded RGBA8 image, already scaled for display.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Season-level information ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoInfoView {
    pub cover_url: String,
    pub cover: Option<PathBuf>,
    pub title: String,
    pub video_zone: String,
    pub play_number: String,
    pub danmaku_number: String,
    pub like_number: String,
    pub coin_number: String,
    pub favorite_number: String,
    pub share_number: String,
    pub reply_number: String,
    pub description: String,
    pub up_name: String,
    #[serde(skip)]
    pub up_header: Option<Thumbnail>,
    pub upper_mid: Option<i64>,
}
