//! Display formatting helpers for counts, durations and category labels.

/// Format a count as a short human-readable magnitude ("12.3万", "1.2亿").
pub fn format_magnitude(n: i64) -> String {
    if n > 99_999_999 {
        format!("{:.1}亿", n as f64 / 100_000_000.0)
    } else if n > 9_999 {
        format!("{:.1}万", n as f64 / 10_000.0)
    } else {
        n.to_string()
    }
}

/// Format a millisecond duration as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(duration_ms: u64) -> String {
    let total = duration_ms / 1000;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Lookup of user-facing strings by key.
pub trait Localize: Send + Sync {
    fn localize(&self, key: &str) -> String;
}

/// Built-in string table for the bangumi category labels.
#[derive(Debug, Clone)]
pub struct BuiltinStrings {
    english: bool,
}

impl BuiltinStrings {
    /// `language` is a tag like `zh-CN` or `en`. Anything not English uses Chinese.
    pub fn new(language: &str) -> Self {
        Self {
            english: language.to_ascii_lowercase().starts_with("en"),
        }
    }
}

impl Default for BuiltinStrings {
    fn default() -> Self {
        Self::new("zh-CN")
    }
}

impl Localize for BuiltinStrings {
    fn localize(&self, key: &str) -> String {
        let (zh, en) = match key {
            "BangumiAnime" => ("番剧", "Anime"),
            "BangumiMovie" => ("电影", "Movie"),
            "BangumiDocumentary" => ("纪录片", "Documentary"),
            "BangumiGuochuang" => ("国创", "Guochuang"),
            "BangumiTv" => ("电视剧", "TV Series"),
            "BangumiVariety" => ("综艺", "Variety"),
            "BangumiUnknown" => ("未知", "Unknown"),
            other => return other.to_string(),
        };
        if self.english { en } else { zh }.to_string()
    }
}
