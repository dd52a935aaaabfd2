use serde::Deserialize;

use hikari_core::models::{
    BangumiType, Episode, MediaStream, PositiveSection, Season, SeasonStat, Section, StreamInfo,
    StreamQuality, UpInfo,
};

use super::error::BiliError;
use crate::traits::MediaInfo;

/// Codes the API uses for a missing season, episode or media.
const NOT_FOUND_CODES: &[i64] = &[-404, -400];

// ── Response envelope ───────────────────────────────────────────

/// `{ code, message, result }`. The pgc endpoints put the payload under
/// `result`, a few older ones under `data`.
#[derive(Debug, Deserialize)]
pub struct BiliResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(alias = "data")]
    pub result: Option<T>,
}

impl<T> BiliResponse<T> {
    /// Unwrap the payload, mapping non-zero codes to errors.
    pub fn into_result(self, what: &str) -> Result<T, BiliError> {
        if NOT_FOUND_CODES.contains(&self.code) {
            return Err(BiliError::NotFound(format!("{what}: {}", self.message)));
        }
        if self.code != 0 {
            return Err(BiliError::Api {
                code: self.code,
                message: self.message,
            });
        }
        self.result
            .ok_or_else(|| BiliError::NotFound(format!("{what}: empty result")))
    }
}

// ── Season ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BiliSeason {
    pub season_id: i64,
    #[serde(default)]
    pub media_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub evaluate: String,
    #[serde(rename = "type", default)]
    pub kind: i32,
    pub positive: Option<BiliPositive>,
    pub episodes: Option<Vec<BiliEpisode>>,
    pub section: Option<Vec<BiliSection>>,
    pub stat: Option<BiliStat>,
    pub up_info: Option<BiliUpInfo>,
}

#[derive(Debug, Deserialize)]
pub struct BiliPositive {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct BiliEpisode {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub aid: i64,
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub cid: i64,
    #[serde(default)]
    pub title: String,
    pub long_title: Option<String>,
    #[serde(default)]
    pub share_copy: String,
    #[serde(default)]
    pub cover: String,
}

#[derive(Debug, Deserialize)]
pub struct BiliSection {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub episodes: Option<Vec<BiliEpisode>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BiliStat {
    pub coins: i64,
    pub danmakus: i64,
    #[serde(alias = "favorite")]
    pub favorites: i64,
    pub likes: i64,
    pub reply: i64,
    pub share: i64,
    pub views: i64,
}

#[derive(Debug, Deserialize)]
pub struct BiliUpInfo {
    pub mid: i64,
    #[serde(default)]
    pub uname: String,
    #[serde(default)]
    pub avatar: String,
}

// ── Media ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BiliMediaResult {
    pub media: BiliMedia,
}

#[derive(Debug, Deserialize)]
pub struct BiliMedia {
    pub media_id: i64,
    pub season_id: i64,
    #[serde(default)]
    pub title: String,
}

// ── Play URL ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BiliPlayUrl {
    #[serde(default)]
    pub quality: i32,
    /// Milliseconds.
    #[serde(default)]
    pub timelength: u64,
    #[serde(default)]
    pub accept_quality: Vec<i32>,
    #[serde(default)]
    pub accept_description: Vec<String>,
    pub dash: Option<BiliDash>,
    pub durl: Option<Vec<BiliDurl>>,
}

#[derive(Debug, Deserialize)]
pub struct BiliDash {
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    pub video: Option<Vec<BiliDashStream>>,
    pub audio: Option<Vec<BiliDashStream>>,
}

#[derive(Debug, Deserialize)]
pub struct BiliDashStream {
    pub id: i32,
    pub base_url: String,
    pub backup_url: Option<Vec<String>>,
    #[serde(default)]
    pub bandwidth: u64,
    #[serde(default)]
    pub codecs: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Legacy FLV/MP4 segment.
#[derive(Debug, Deserialize)]
pub struct BiliDurl {
    #[serde(default)]
    pub order: u32,
    /// Milliseconds.
    #[serde(default)]
    pub length: u64,
    pub url: String,
    pub backup_url: Option<Vec<String>>,
}

// ── Conversions to core models ──────────────────────────────────

impl BiliEpisode {
    pub fn into_episode(self) -> Episode {
        Episode {
            id: self.id,
            title: self.title,
            long_title: self.long_title,
            share_copy: self.share_copy,
            aid: self.aid,
            bvid: self.bvid,
            cid: self.cid,
            cover: self.cover,
        }
    }
}

fn into_episodes(episodes: Option<Vec<BiliEpisode>>) -> Vec<Episode> {
    episodes
        .unwrap_or_default()
        .into_iter()
        .map(BiliEpisode::into_episode)
        .collect()
}

impl BiliSeason {
    pub fn into_season(self) -> Season {
        let stat = self.stat.unwrap_or_default();
        Season {
            season_id: self.season_id,
            media_id: self.media_id,
            title: self.title,
            cover: self.cover,
            evaluate: self.evaluate,
            kind: BangumiType::from_code(self.kind),
            positive: self
                .positive
                .map(|p| PositiveSection {
                    id: p.id,
                    title: p.title,
                })
                .unwrap_or_default(),
            episodes: into_episodes(self.episodes),
            sections: self
                .section
                .unwrap_or_default()
                .into_iter()
                .map(|s| Section {
                    id: s.id,
                    title: s.title,
                    episodes: into_episodes(s.episodes),
                })
                .collect(),
            stat: SeasonStat {
                views: stat.views,
                danmakus: stat.danmakus,
                likes: stat.likes,
                coins: stat.coins,
                favorites: stat.favorites,
                share: stat.share,
                reply: stat.reply,
            },
            up_info: self.up_info.map(|up| UpInfo {
                mid: up.mid,
                name: up.uname,
                avatar: up.avatar,
            }),
        }
    }
}

impl BiliMediaResult {
    pub fn into_media_info(self) -> MediaInfo {
        MediaInfo {
            media_id: self.media.media_id,
            season_id: self.media.season_id,
            title: self.media.title,
        }
    }
}

impl BiliDashStream {
    fn into_media_stream(self) -> MediaStream {
        MediaStream {
            id: self.id,
            base_url: self.base_url,
            backup_urls: self.backup_url.unwrap_or_default(),
            bandwidth: self.bandwidth,
            codecs: self.codecs,
            width: self.width,
            height: self.height,
        }
    }
}

impl BiliPlayUrl {
    /// Convert to [`StreamInfo`]. A response with neither DASH video nor
    /// segments is an unavailable stream.
    pub fn into_stream_info(self) -> Result<StreamInfo, BiliError> {
        let qualities = self
            .accept_quality
            .iter()
            .zip(self.accept_description.iter())
            .map(|(&id, desc)| StreamQuality {
                id,
                description: desc.clone(),
            })
            .collect();

        let (dash_secs, video, audio) = match self.dash {
            Some(dash) => (
                dash.duration,
                dash.video
                    .unwrap_or_default()
                    .into_iter()
                    .map(BiliDashStream::into_media_stream)
                    .collect::<Vec<_>>(),
                dash.audio
                    .unwrap_or_default()
                    .into_iter()
                    .map(BiliDashStream::into_media_stream)
                    .collect(),
            ),
            None => (0, Vec::new(), Vec::new()),
        };

        let (video, segments_ms) = if video.is_empty() {
            let mut segments = self.durl.unwrap_or_default();
            segments.sort_by_key(|d| d.order);
            let total: u64 = segments.iter().map(|d| d.length).sum();
            let streams = segments
                .into_iter()
                .map(|d| MediaStream {
                    id: self.quality,
                    base_url: d.url,
                    backup_urls: d.backup_url.unwrap_or_default(),
                    ..Default::default()
                })
                .collect();
            (streams, total)
        } else {
            (video, 0)
        };

        if video.is_empty() {
            return Err(BiliError::StreamUnavailable(
                "no DASH video or segments in play URL response".into(),
            ));
        }

        let duration_ms = if self.timelength > 0 {
            self.timelength
        } else if segments_ms > 0 {
            segments_ms
        } else {
            dash_secs * 1000
        };

        Ok(StreamInfo {
            quality: self.quality,
            duration_ms,
            qualities,
            video,
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASON_JSON: &str = r#"{
        "code": 0,
        "message": "success",
        "result": {
            "season_id": 28747,
            "media_id": 28229233,
            "title": "间谍过家家",
            "cover": "https://i0.hdslb.com/bfs/bangumi/image/spy.png",
            "evaluate": "Twilight must build a family...",
            "type": 1,
            "positive": {"id": 33624, "title": "正片"},
            "episodes": [
                {
                    "id": 691614, "aid": 553203826, "bvid": "BV1eZ4y1k7wV", "cid": 729826345,
                    "title": "1", "long_title": "行动代号枭", "share_copy": "《间谍过家家》第1话 行动代号枭",
                    "cover": "https://i0.hdslb.com/bfs/archive/ep1.png"
                },
                {
                    "id": 691615, "aid": 553203827, "bvid": "BV1eZ4y1k7wX", "cid": 729826346,
                    "title": "OVA", "long_title": "", "share_copy": "OVA"
                }
            ],
            "section": [
                {"id": 71420, "title": "PV", "episodes": [
                    {"id": 1, "aid": 2, "bvid": "BV1", "cid": 3, "title": "1", "long_title": "先导PV", "share_copy": "x"}
                ]},
                {"id": 71421, "title": "特别篇", "episodes": null}
            ],
            "stat": {"coins": 1, "danmakus": 2, "favorite": 3, "likes": 4, "reply": 5, "share": 6, "views": 7},
            "up_info": {"mid": 928123, "uname": "哔哩哔哩番剧", "avatar": "https://i0.hdslb.com/bfs/face/a.jpg"}
        }
    }"#;

    #[test]
    fn test_deserialize_season() {
        let resp: BiliResponse<BiliSeason> = serde_json::from_str(SEASON_JSON).unwrap();
        let season = resp.into_result("season").unwrap().into_season();

        assert_eq!(season.season_id, 28747);
        assert_eq!(season.media_id, 28229233);
        assert_eq!(season.kind, BangumiType::Anime);
        assert_eq!(season.positive.id, 33624);
        assert_eq!(season.episodes.len(), 2);
        assert_eq!(season.episodes[0].long_title.as_deref(), Some("行动代号枭"));
        assert_eq!(season.episodes[1].cover, "");
        assert_eq!(season.sections.len(), 2);
        assert_eq!(season.sections[0].episodes[0].title, "1");
        assert!(season.sections[1].episodes.is_empty());
        assert_eq!(season.stat.favorites, 3);
        assert_eq!(season.stat.views, 7);

        let up = season.up_info.unwrap();
        assert_eq!(up.mid, 928123);
        assert_eq!(up.name, "哔哩哔哩番剧");
    }

    #[test]
    fn test_deserialize_null_lists() {
        let json = r#"{
            "code": 0,
            "result": {"season_id": 1, "title": "Test", "episodes": null, "section": null, "up_info": null}
        }"#;
        let resp: BiliResponse<BiliSeason> = serde_json::from_str(json).unwrap();
        let season = resp.into_result("season").unwrap().into_season();

        assert!(season.episodes.is_empty());
        assert!(season.sections.is_empty());
        assert!(season.up_info.is_none());
        assert_eq!(season.positive, PositiveSection::default());
        assert_eq!(season.kind, BangumiType::Unknown(0));
    }

    #[test]
    fn test_not_found_code() {
        let json = r#"{"code": -404, "message": "啥都木有"}"#;
        let resp: BiliResponse<BiliSeason> = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.into_result("season"), Err(BiliError::NotFound(_))));
    }

    #[test]
    fn test_api_error_code() {
        let json = r#"{"code": -412, "message": "请求被拦截"}"#;
        let resp: BiliResponse<BiliSeason> = serde_json::from_str(json).unwrap();
        match resp.into_result("season") {
            Err(BiliError::Api { code, message }) => {
                assert_eq!(code, -412);
                assert_eq!(message, "请求被拦截");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_media() {
        let json = r#"{
            "code": 0,
            "message": "success",
            "result": {"media": {"media_id": 28229233, "season_id": 28747, "title": "间谍过家家", "type_name": "番剧"}}
        }"#;
        let resp: BiliResponse<BiliMediaResult> = serde_json::from_str(json).unwrap();
        let media = resp.into_result("media").unwrap().into_media_info();
        assert_eq!(media.season_id, 28747);
        assert_eq!(media.media_id, 28229233);
    }

    #[test]
    fn test_play_url_dash() {
        let json = r#"{
            "code": 0,
            "result": {
                "quality": 80,
                "timelength": 1425000,
                "accept_quality": [116, 80, 64],
                "accept_description": ["高清 1080P60", "高清 1080P", "高清 720P"],
                "dash": {
                    "duration": 1425,
                    "video": [{
                        "id": 80, "base_url": "https://upos/v.m4s", "baseUrl": "https://upos/v.m4s",
                        "backup_url": ["https://bak/v.m4s"], "bandwidth": 1200000,
                        "codecs": "avc1.640032", "width": 1920, "height": 1080
                    }],
                    "audio": [{"id": 30280, "base_url": "https://upos/a.m4s", "bandwidth": 320000, "codecs": "mp4a.40.2"}]
                }
            }
        }"#;
        let resp: BiliResponse<BiliPlayUrl> = serde_json::from_str(json).unwrap();
        let info = resp.into_result("playurl").unwrap().into_stream_info().unwrap();

        assert_eq!(info.quality, 80);
        assert_eq!(info.duration_ms, 1_425_000);
        assert_eq!(info.qualities.len(), 3);
        assert_eq!(info.qualities[1].description, "高清 1080P");
        assert_eq!(info.video[0].backup_urls, vec!["https://bak/v.m4s".to_string()]);
        assert_eq!(info.video[0].height, 1080);
        assert_eq!(info.audio[0].id, 30280);
        assert!(info.audio[0].backup_urls.is_empty());
    }

    #[test]
    fn test_play_url_segments_fallback() {
        let json = r#"{
            "quality": 32,
            "accept_quality": [32],
            "accept_description": ["清晰 480P"],
            "durl": [
                {"order": 2, "length": 1000, "url": "https://upos/2.flv"},
                {"order": 1, "length": 2000, "url": "https://upos/1.flv"}
            ]
        }"#;
        let play: BiliPlayUrl = serde_json::from_str(json).unwrap();
        let info = play.into_stream_info().unwrap();

        assert_eq!(info.video.len(), 2);
        assert_eq!(info.video[0].base_url, "https://upos/1.flv");
        assert_eq!(info.video[0].id, 32);
        assert!(info.audio.is_empty());
        assert_eq!(info.duration_ms, 3000);
    }

    #[test]
    fn test_play_url_timelength_wins_over_segments() {
        let json = r#"{
            "quality": 64,
            "timelength": 1420000,
            "durl": [{"order": 1, "length": 600000, "url": "https://upos/1.flv"}]
        }"#;
        let play: BiliPlayUrl = serde_json::from_str(json).unwrap();
        assert_eq!(play.into_stream_info().unwrap().duration_ms, 1_420_000);
    }

    #[test]
    fn test_play_url_segments_sum_to_duration() {
        let json = r#"{
            "quality": 64,
            "durl": [
                {"order": 1, "length": 600000, "url": "https://upos/1.flv"},
                {"order": 2, "length": 820000, "url": "https://upos/2.flv"}
            ]
        }"#;
        let play: BiliPlayUrl = serde_json::from_str(json).unwrap();
        assert_eq!(play.into_stream_info().unwrap().duration_ms, 1_420_000);
    }

    #[test]
    fn test_play_url_empty_is_unavailable() {
        let json = r#"{"quality": 0, "dash": {"duration": 10, "video": [], "audio": null}}"#;
        let play: BiliPlayUrl = serde_json::from_str(json).unwrap();
        assert!(matches!(
            play.into_stream_info(),
            Err(BiliError::StreamUnavailable(_))
        ));
    }
}
