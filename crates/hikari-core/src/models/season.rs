use serde::{Deserialize, Serialize};

/// One playable unit of a season or section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode id (`ep_id`).
    pub id: i64,
    pub title: String,
    pub long_title: Option<String>,
    /// Human-readable caption, used as the name when `title` is only a number.
    pub share_copy: String,
    pub aid: i64,
    pub bvid: String,
    pub cid: i64,
    pub cover: String,
}

/// A named sub-grouping of episodes (extras, specials, PVs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub title: String,
    pub episodes: Vec<Episode>,
}

/// Identity of the main ("positive") section of a season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositiveSection {
    pub id: i64,
    pub title: String,
}

/// Season-level engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStat {
    pub views: i64,
    pub danmakus: i64,
    pub likes: i64,
    pub coins: i64,
    pub favorites: i64,
    pub share: i64,
    pub reply: i64,
}

/// Uploader attached to a season. Most licensed seasons have none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpInfo {
    pub mid: i64,
    pub name: String,
    pub avatar: String,
}

/// Category of a bangumi season, as reported by the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BangumiType {
    Anime,
    Movie,
    Documentary,
    Guochuang,
    Tv,
    Variety,
    Unknown(i32),
}

impl BangumiType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Anime,
            2 => Self::Movie,
            3 => Self::Documentary,
            4 => Self::Guochuang,
            5 => Self::Tv,
            7 => Self::Variety,
            other => Self::Unknown(other),
        }
    }

    /// Localization key for the category label.
    pub fn key(self) -> &'static str {
        match self {
            Self::Anime => "BangumiAnime",
            Self::Movie => "BangumiMovie",
            Self::Documentary => "BangumiDocumentary",
            Self::Guochuang => "BangumiGuochuang",
            Self::Tv => "BangumiTv",
            Self::Variety => "BangumiVariety",
            Self::Unknown(_) => "BangumiUnknown",
        }
    }
}

impl Default for BangumiType {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

/// A season as returned by the metadata source. Read-only snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub season_id: i64,
    pub media_id: i64,
    pub title: String,
    pub cover: String,
    /// Free-text synopsis.
    pub evaluate: String,
    pub kind: BangumiType,
    pub positive: PositiveSection,
    /// The main episode list.
    pub episodes: Vec<Episode>,
    /// Auxiliary sections, in source order.
    pub sections: Vec<Section>,
    pub stat: SeasonStat,
    pub up_info: Option<UpInfo>,
}
