mod db;
pub mod images;

use futures::future::OptionFuture;
use tracing::{debug, info, warn};

use hikari_api::traits::{MetadataSource, StreamResolver};
use hikari_core::config::AppConfig;
use hikari_core::format::{format_duration, BuiltinStrings, Localize};
use hikari_core::models::{Season, VideoPage, VideoSection};
use hikari_core::normalize::{build_main_page_list, build_section_tree};
use hikari_core::view::{build_display_info, ResolvedImages, ViewSink};
use hikari_parse::{classify, BangumiInput};

pub use db::IndexHandle;
pub use images::{ImageCache, ImageStore};

/// Source kind under which season covers are cached.
pub const COVER_KIND: &str = "bangumi";
/// Cover index used for the season cover itself.
pub const SEASON_COVER_INDEX: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("stream unavailable for av{avid} cid {cid}: {source}")]
    StreamUnavailable {
        avid: i64,
        cid: i64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Presentation settings for [`BangumiInfoService`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Edge length of the square avatar thumbnail.
    pub header_thumbnail_size: u32,
    pub strings: BuiltinStrings,
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            header_thumbnail_size: config.cache.header_thumbnail_size,
            strings: BuiltinStrings::new(&config.general.language),
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            header_thumbnail_size: 48,
            strings: BuiltinStrings::default(),
        }
    }
}

/// One bangumi season, fetched once from user input.
///
/// Lookup failures are not errors here: an unrecognised or unknown input
/// leaves the service without a season, and every list operation then
/// returns an empty result.
pub struct BangumiInfoService<C, I> {
    season: Option<Season>,
    client: C,
    images: I,
    options: ServiceOptions,
}

impl<C, I> BangumiInfoService<C, I>
where
    C: MetadataSource + StreamResolver,
    I: ImageStore,
{
    pub async fn new(input: &str, client: C, images: I, options: ServiceOptions) -> Self {
        let season = Self::parse_and_fetch(input, &client).await;
        Self {
            season,
            client,
            images,
            options,
        }
    }

    /// Classify `input` and fetch the season it names.
    pub async fn parse_and_fetch(input: &str, source: &C) -> Option<Season> {
        let Some(parsed) = classify(input) else {
            warn!(input, "Input is not a bangumi id or URL");
            return None;
        };

        let fetched = match parsed {
            BangumiInput::Season(id) => source.season_by_id(id).await,
            BangumiInput::Episode(id) => source.season_by_episode_id(id).await,
            BangumiInput::Media(id) => match source.media_by_id(id).await {
                Ok(media) => {
                    debug!(media_id = id, season_id = media.season_id, "Resolved media");
                    source.season_by_id(media.season_id).await
                }
                Err(e) => Err(e),
            },
        };

        match fetched {
            Ok(season) => {
                info!(
                    season_id = season.season_id,
                    title = %season.title,
                    episodes = season.episodes.len(),
                    "Loaded season"
                );
                Some(season)
            }
            Err(e) => {
                warn!(?parsed, "Season lookup failed: {e}");
                None
            }
        }
    }

    pub fn season(&self) -> Option<&Season> {
        self.season.as_ref()
    }

    /// Main episode list; empty without a season.
    pub fn video_pages(&self) -> Vec<VideoPage> {
        self.season
            .as_ref()
            .map(build_main_page_list)
            .unwrap_or_default()
    }

    pub fn video_sections(&self) -> Option<Vec<VideoSection>> {
        self.season.as_ref().and_then(build_section_tree)
    }

    /// Resolve playable streams for `page`, filling its duration and stream.
    pub async fn resolve_stream_info(&self, page: &mut VideoPage) -> Result<(), ServiceError> {
        let info = self
            .client
            .resolve_play_url(page.avid, &page.bvid, page.cid)
            .await
            .map_err(|e| ServiceError::StreamUnavailable {
                avid: page.avid,
                cid: page.cid,
                source: Box::new(e),
            })?;

        page.duration = format_duration(info.duration_ms);
        page.stream = Some(info);
        Ok(())
    }

    /// Build the display view and hand it to `sink`.
    ///
    /// Returns `false` without calling the sink when there is no season.
    pub async fn publish_video_view(&self, sink: impl ViewSink) -> bool {
        let Some(season) = &self.season else {
            return false;
        };

        let size = self.options.header_thumbnail_size;
        let cover = self.images.get_cover(
            season.season_id,
            COVER_KIND,
            SEASON_COVER_INDEX,
            &season.cover,
        );
        let header: OptionFuture<_> = season
            .up_info
            .as_ref()
            .map(|up| async move {
                let path = self.images.get_header(up.mid, &up.name, &up.avatar).await?;
                let thumbnail = self.images.header_thumbnail(&path, size, size).await;
                Some((path, thumbnail))
            })
            .into();

        let (cover, header) = futures::join!(cover, header);
        let (up_header_path, up_header) = match header.flatten() {
            Some((path, thumbnail)) => (Some(path), thumbnail),
            None => (None, None),
        };
        let images = ResolvedImages {
            cover,
            up_header_path,
            up_header,
        };

        let strings: &dyn Localize = &self.options.strings;
        sink.publish(build_display_info(season, images, strings));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use hikari_api::traits::MediaInfo;
    use hikari_core::models::{
        BangumiType, Episode, PositiveSection, Section, SeasonStat, StreamInfo, Thumbnail, UpInfo,
        VideoInfoView, DURATION_PLACEHOLDER,
    };

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct FakeError(String);

    #[derive(Default)]
    struct FakeClient {
        season: Option<Season>,
        stream: Option<StreamInfo>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn with_season(season: Season) -> Self {
            Self {
                season: Some(season),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn lookup(&self, call: String) -> Result<Season, FakeError> {
            self.calls.lock().unwrap().push(call);
            self.season
                .clone()
                .ok_or_else(|| FakeError("not found".into()))
        }
    }

    impl MetadataSource for FakeClient {
        type Error = FakeError;

        async fn season_by_id(&self, season_id: i64) -> Result<Season, FakeError> {
            self.lookup(format!("ss{season_id}"))
        }

        async fn season_by_episode_id(&self, episode_id: i64) -> Result<Season, FakeError> {
            self.lookup(format!("ep{episode_id}"))
        }

        async fn media_by_id(&self, media_id: i64) -> Result<MediaInfo, FakeError> {
            self.calls.lock().unwrap().push(format!("md{media_id}"));
            Ok(MediaInfo {
                media_id,
                season_id: 45969,
                title: "葬送的芙莉莲".into(),
            })
        }
    }

    impl StreamResolver for FakeClient {
        type Error = FakeError;

        async fn resolve_play_url(
            &self,
            _avid: i64,
            _bvid: &str,
            _cid: i64,
        ) -> Result<StreamInfo, FakeError> {
            self.stream
                .clone()
                .ok_or_else(|| FakeError("no stream".into()))
        }
    }

    #[derive(Default)]
    struct FakeImages {
        lookups: AtomicUsize,
        broken_thumbnails: bool,
    }

    impl ImageStore for FakeImages {
        async fn get_cover(&self, _: i64, _: &str, _: i64, url: &str) -> Option<PathBuf> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            (!url.is_empty()).then(|| PathBuf::from("/cache/cover.png"))
        }

        async fn get_header(&self, _: i64, _: &str, url: &str) -> Option<PathBuf> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            (!url.is_empty()).then(|| PathBuf::from("/cache/face.jpg"))
        }

        async fn header_thumbnail(&self, _: &Path, width: u32, height: u32) -> Option<Thumbnail> {
            if self.broken_thumbnails {
                return None;
            }
            Some(Thumbnail {
                width,
                height,
                rgba: vec![0; (width * height * 4) as usize],
            })
        }
    }

    fn episode(id: i64, title: &str, long_title: &str) -> Episode {
        Episode {
            id,
            title: title.into(),
            long_title: Some(long_title.into()),
            share_copy: format!("《葬送的芙莉莲》第{title}话 {long_title}"),
            aid: id * 10,
            bvid: format!("BV{id}"),
            cid: id * 100,
            cover: String::new(),
        }
    }

    fn season() -> Season {
        Season {
            season_id: 45969,
            title: "葬送的芙莉莲".into(),
            cover: "https://i0.hdslb.com/bfs/bangumi/image/cover.png".into(),
            kind: BangumiType::Anime,
            positive: PositiveSection {
                id: 1,
                title: "正片".into(),
            },
            episodes: vec![episode(1, "1", "冒险的结束"), episode(2, "2", "")],
            sections: vec![Section {
                id: 2,
                title: "PV".into(),
                episodes: vec![episode(9, "PV1", "")],
            }],
            stat: SeasonStat {
                views: 123_456,
                ..Default::default()
            },
            up_info: Some(UpInfo {
                mid: 928123,
                name: "哔哩哔哩番剧".into(),
                avatar: "https://i0.hdslb.com/bfs/face/a.jpg".into(),
            }),
            ..Default::default()
        }
    }

    async fn service(input: &str, client: FakeClient) -> BangumiInfoService<FakeClient, FakeImages> {
        BangumiInfoService::new(input, client, FakeImages::default(), ServiceOptions::default()).await
    }

    #[tokio::test]
    async fn test_season_input_fetches_by_id() {
        let svc = service("ss45969", FakeClient::with_season(season())).await;
        assert_eq!(svc.client.calls(), vec!["ss45969"]);

        let pages = svc.video_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].name, "《葬送的芙莉莲》第1话 冒险的结束");
        assert_eq!(pages[1].order, 2);
        assert_eq!(pages[1].duration, DURATION_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_episode_url_fetches_by_episode() {
        let svc = service(
            "https://www.bilibili.com/bangumi/play/ep775463",
            FakeClient::with_season(season()),
        )
        .await;
        assert_eq!(svc.client.calls(), vec!["ep775463"]);
        assert!(svc.season().is_some());
    }

    #[tokio::test]
    async fn test_media_input_resolves_season() {
        let svc = service("md21087073", FakeClient::with_season(season())).await;
        assert_eq!(svc.client.calls(), vec!["md21087073", "ss45969"]);
        assert_eq!(svc.season().map(|s| s.season_id), Some(45969));
    }

    #[tokio::test]
    async fn test_unrecognised_input_skips_lookup() {
        let svc = service("BV1xx411c7mD", FakeClient::with_season(season())).await;
        assert!(svc.client.calls().is_empty());
        assert!(svc.season().is_none());
    }

    #[tokio::test]
    async fn test_absent_season_is_empty() {
        let svc = service("ss1", FakeClient::default()).await;
        assert!(svc.season().is_none());
        assert!(svc.video_pages().is_empty());
        assert!(svc.video_sections().is_none());

        let mut published = false;
        assert!(!svc.publish_video_view(|_: VideoInfoView| published = true).await);
        assert!(!published);
        assert_eq!(svc.images.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sections_from_service() {
        let svc = service("ss45969", FakeClient::with_season(season())).await;
        let sections = svc.video_sections().unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].is_selected);
        assert_eq!(sections[0].title, "正片");
        assert_eq!(sections[1].pages[0].name, "PV1");
    }

    #[tokio::test]
    async fn test_resolve_stream_fills_page() {
        let client = FakeClient {
            stream: Some(StreamInfo {
                quality: 80,
                duration_ms: 1_420_000,
                ..Default::default()
            }),
            ..FakeClient::with_season(season())
        };
        let svc = service("ss45969", client).await;

        let mut page = svc.video_pages().remove(0);
        svc.resolve_stream_info(&mut page).await.unwrap();
        assert_eq!(page.duration, "23:40");
        assert_eq!(page.stream.map(|s| s.quality), Some(80));
    }

    #[tokio::test]
    async fn test_resolve_stream_failure_propagates() {
        let svc = service("ss45969", FakeClient::with_season(season())).await;
        let mut page = svc.video_pages().remove(0);

        let err = svc.resolve_stream_info(&mut page).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::StreamUnavailable { avid: 10, cid: 100, .. }
        ));
        assert_eq!(page.duration, DURATION_PLACEHOLDER);
        assert!(page.stream.is_none());
    }

    #[tokio::test]
    async fn test_view_published_once() {
        let svc = service("ss45969", FakeClient::with_season(season())).await;

        let mut views = Vec::new();
        assert!(svc.publish_video_view(|v: VideoInfoView| views.push(v)).await);
        assert_eq!(views.len(), 1);

        let view = &views[0];
        assert_eq!(view.title, "葬送的芙莉莲");
        assert_eq!(view.video_zone, "番剧");
        assert_eq!(view.play_number, "12.3万");
        assert_eq!(view.cover.as_deref(), Some(Path::new("/cache/cover.png")));
        assert_eq!(view.up_name, "哔哩哔哩番剧");
        assert_eq!(view.upper_mid, Some(928123));
        assert_eq!(view.up_header.as_ref().map(|t| t.width), Some(48));
    }

    #[tokio::test]
    async fn test_view_without_uploader() {
        let mut s = season();
        s.up_info = None;
        let svc = service("ss45969", FakeClient::with_season(s)).await;

        let (tx, rx) = tokio::sync::oneshot::channel();
        assert!(svc.publish_video_view(tx).await);
        let view = rx.await.unwrap();
        assert_eq!(view.up_name, "");
        assert!(view.up_header.is_none());
        assert!(view.upper_mid.is_none());
        assert_eq!(svc.images.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_view_keeps_uploader_mid_without_thumbnail() {
        let images = FakeImages {
            broken_thumbnails: true,
            ..Default::default()
        };
        let svc = BangumiInfoService::new(
            "ss45969",
            FakeClient::with_season(season()),
            images,
            ServiceOptions::default(),
        )
        .await;

        let mut views = Vec::new();
        assert!(svc.publish_video_view(|v: VideoInfoView| views.push(v)).await);
        assert_eq!(views[0].upper_mid, Some(928123));
        assert!(views[0].up_header.is_none());
    }

    #[tokio::test]
    async fn test_view_with_uncached_images_still_publishes() {
        let mut s = season();
        s.cover = String::new();
        if let Some(up) = s.up_info.as_mut() {
            up.avatar = String::new();
        }
        let svc = service("ss45969", FakeClient::with_season(s)).await;

        let mut views = Vec::new();
        assert!(svc.publish_video_view(|v: VideoInfoView| views.push(v)).await);
        let view = &views[0];
        assert!(view.cover.is_none());
        assert_eq!(view.up_name, "哔哩哔哩番剧");
        assert!(view.upper_mid.is_none());
        assert!(view.up_header.is_none());
    }
}
