use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER};
use reqwest::Client;
use serde::de::DeserializeOwned;

use hikari_core::config::AppConfig;
use hikari_core::models::{Season, StreamInfo};

use super::error::BiliError;
use super::types::{BiliMediaResult, BiliPlayUrl, BiliResponse, BiliSeason};
use crate::traits::{MediaInfo, MetadataSource, StreamResolver};

const BASE_URL: &str = "https://api.bilibili.com";
const REFERER_URL: &str = "https://www.bilibili.com";

/// Connection settings for [`BiliClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout: Duration,
    /// `SESSDATA` login cookie.
    pub sessdata: Option<String>,
    /// Requested quality id (`qn`).
    pub quality: u32,
    /// Stream format flags (`fnval`).
    pub fnval: u32,
}

impl ClientOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.network.user_agent.clone(),
            timeout: Duration::from_secs(config.network.timeout_secs),
            sessdata: config
                .network
                .sessdata
                .clone()
                .filter(|s| !s.trim().is_empty()),
            quality: config.stream.quality,
            fnval: config.stream.fnval,
        }
    }
}

/// Bilibili web API client for bangumi seasons and play URLs.
#[derive(Clone)]
pub struct BiliClient {
    http: Client,
    quality: u32,
    fnval: u32,
}

impl BiliClient {
    pub fn new(options: ClientOptions) -> Result<Self, BiliError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
        if let Some(sessdata) = &options.sessdata {
            let cookie = HeaderValue::from_str(&format!("SESSDATA={sessdata}"))
                .map_err(|e| BiliError::Parse(format!("invalid SESSDATA: {e}")))?;
            headers.insert(COOKIE, cookie);
        }

        let http = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            quality: options.quality,
            fnval: options.fnval,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BiliError> {
        Self::new(ClientOptions::from_config(config))
    }

    /// GET an endpoint and unwrap its `{code, message, result}` envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, BiliError> {
        let resp = self
            .http
            .get(format!("{BASE_URL}{path}"))
            .query(query)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let body: BiliResponse<T> = resp
            .json()
            .await
            .map_err(|e| BiliError::Parse(e.to_string()))?;

        body.into_result(what)
    }

    /// Check the HTTP status and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, BiliError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Bilibili API HTTP error");
            Err(BiliError::Api {
                code: i64::from(status),
                message: body,
            })
        }
    }

    async fn season(&self, key: &str, id: i64) -> Result<Season, BiliError> {
        let season: BiliSeason = self
            .get("/pgc/view/web/season", &[(key, id.to_string())], "season")
            .await?;
        let season = season.into_season();
        tracing::debug!(
            season_id = season.season_id,
            episodes = season.episodes.len(),
            sections = season.sections.len(),
            "Fetched season"
        );
        Ok(season)
    }
}

impl MetadataSource for BiliClient {
    type Error = BiliError;

    async fn season_by_id(&self, season_id: i64) -> Result<Season, BiliError> {
        self.season("season_id", season_id).await
    }

    async fn season_by_episode_id(&self, episode_id: i64) -> Result<Season, BiliError> {
        self.season("ep_id", episode_id).await
    }

    async fn media_by_id(&self, media_id: i64) -> Result<MediaInfo, BiliError> {
        let media: BiliMediaResult = self
            .get(
                "/pgc/review/user",
                &[("media_id", media_id.to_string())],
                "media",
            )
            .await?;
        Ok(media.into_media_info())
    }
}

impl StreamResolver for BiliClient {
    type Error = BiliError;

    async fn resolve_play_url(
        &self,
        avid: i64,
        bvid: &str,
        cid: i64,
    ) -> Result<StreamInfo, BiliError> {
        let query = [
            ("avid", avid.to_string()),
            ("bvid", bvid.to_string()),
            ("cid", cid.to_string()),
            ("qn", self.quality.to_string()),
            ("fnval", self.fnval.to_string()),
            ("fnver", "0".to_string()),
            ("fourk", "1".to_string()),
        ];
        let play: BiliPlayUrl = match self.get("/pgc/player/web/playurl", &query, "playurl").await {
            Ok(play) => play,
            Err(BiliError::NotFound(msg)) => return Err(BiliError::StreamUnavailable(msg)),
            Err(e) => return Err(e),
        };

        let info = play.into_stream_info()?;
        tracing::debug!(
            avid,
            cid,
            quality = info.quality,
            video = info.video.len(),
            audio = info.audio.len(),
            "Resolved play URL"
        );
        Ok(info)
    }
}
