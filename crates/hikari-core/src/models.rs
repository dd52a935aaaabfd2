pub mod season;
pub mod video;

pub use season::{BangumiType, Episode, PositiveSection, Season, SeasonStat, Section, UpInfo};
pub use video::{
    MediaStream, StreamInfo, StreamQuality, Thumbnail, VideoInfoView, VideoPage, VideoSection,
    DURATION_PLACEHOLDER, UNSET_EPISODE_ID,
};
