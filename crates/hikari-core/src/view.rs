//! Season display view and its one-shot publication.

use std::path::PathBuf;

use tokio::sync::oneshot;
use tracing::debug;

use crate::format::{format_magnitude, Localize};
use crate::models::{Season, Thumbnail, VideoInfoView};

/// Images already looked up in the image cache for one season.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    pub cover: Option<PathBuf>,
    /// Cached avatar file; only present when the season has an uploader.
    pub up_header_path: Option<PathBuf>,
    /// Avatar thumbnail. May be missing even when the file resolved.
    pub up_header: Option<Thumbnail>,
}

/// Receiver of a fully computed view. Consumed by the single publish call.
pub trait ViewSink {
    fn publish(self, view: VideoInfoView);
}

impl<F> ViewSink for F
where
    F: FnOnce(VideoInfoView),
{
    fn publish(self, view: VideoInfoView) {
        self(view)
    }
}

impl ViewSink for oneshot::Sender<VideoInfoView> {
    fn publish(self, view: VideoInfoView) {
        if self.send(view).is_err() {
            debug!("View receiver dropped before publish");
        }
    }
}

/// Map season metadata onto display fields.
pub fn build_display_info(
    season: &Season,
    images: ResolvedImages,
    strings: &dyn Localize,
) -> VideoInfoView {
    let stat = &season.stat;

    let (up_name, up_header, upper_mid) = match &season.up_info {
        Some(up) => {
            let mid = images.up_header_path.as_ref().map(|_| up.mid);
            (up.name.clone(), images.up_header, mid)
        }
        None => (String::new(), None, None),
    };

    VideoInfoView {
        cover_url: season.cover.clone(),
        cover: images.cover,
        title: season.title.clone(),
        video_zone: strings.localize(season.kind.key()),
        play_number: format_magnitude(stat.views),
        danmaku_number: format_magnitude(stat.danmakus),
        like_number: format_magnitude(stat.likes),
        coin_number: format_magnitude(stat.coins),
        favorite_number: format_magnitude(stat.favorites),
        share_number: format_magnitude(stat.share),
        reply_number: format_magnitude(stat.reply),
        description: season.evaluate.clone(),
        up_name,
        up_header,
        upper_mid,
    }
}
