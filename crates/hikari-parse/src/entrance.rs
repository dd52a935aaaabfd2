use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// What a piece of user input points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BangumiInput {
    /// `ss<id>`: a season.
    Season(i64),
    /// `ep<id>`: one episode; its season is looked up from it.
    Episode(i64),
    /// `md<id>`: a media entry; resolves to a season id.
    Media(i64),
}

// ── Regex patterns ──────────────────────────────────────────────

/// "ss28747", "EP691614", "md28229233".
static RE_PREFIXED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(ss|ep|md)(\d+)$").unwrap());

/// Hosts serving bangumi pages.
const BANGUMI_HOSTS: &[&str] = &["www.bilibili.com", "m.bilibili.com", "bilibili.com"];

/// Classify `input` as a bare id or a bangumi page URL.
///
/// Returns `None` for anything unrecognized.
pub fn classify(input: &str) -> Option<BangumiInput> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let result = try_prefixed_id(input).or_else(|| try_url(input));
    if result.is_none() {
        debug!(input, "Input is not a bangumi id or URL");
    }
    result
}

/// "ss123", "ep123", "md123".
fn try_prefixed_id(text: &str) -> Option<BangumiInput> {
    let caps = RE_PREFIXED_ID.captures(text)?;
    let id: i64 = caps[2].parse().ok()?;
    match caps[1].to_ascii_lowercase().as_str() {
        "ss" => Some(BangumiInput::Season(id)),
        "ep" => Some(BangumiInput::Episode(id)),
        "md" => Some(BangumiInput::Media(id)),
        _ => None,
    }
}

/// "https://www.bilibili.com/bangumi/play/ss123?spm=...", "m.bilibili.com/bangumi/media/md1/".
fn try_url(text: &str) -> Option<BangumiInput> {
    let lower = text.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(text).ok()?
    } else {
        Url::parse(&format!("https://{text}")).ok()?
    };

    let host = url.host_str()?;
    if !BANGUMI_HOSTS.contains(&host) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let [root, kind, id] = segments.as_slice() else {
        return None;
    };
    if *root != "bangumi" {
        return None;
    }

    match (*kind, try_prefixed_id(id)?) {
        ("play", input @ (BangumiInput::Season(_) | BangumiInput::Episode(_))) => Some(input),
        ("media", input @ BangumiInput::Media(_)) => Some(input),
        _ => None,
    }
}
