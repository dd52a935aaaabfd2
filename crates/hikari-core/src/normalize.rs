//! Season normalization: flat page list and section tree.
//!
//! The main episode list and the auxiliary sections name their pages with two
//! different rules. Only the main list replaces a purely numeric title with the
//! episode's `share_copy`; section pages always use `title [long_title]`.

use tracing::debug;

use crate::models::video::{DURATION_PLACEHOLDER, UNSET_EPISODE_ID};
use crate::models::{Episode, Season, VideoPage, VideoSection};

/// Build the page list for the season's main episode list.
///
/// Returns an empty list when the season has no episodes.
pub fn build_main_page_list(season: &Season) -> Vec<VideoPage> {
    build_pages(&season.episodes, main_episode_name)
}

/// Build the section tree: the main list first (selected), then one node per
/// auxiliary section in source order.
///
/// Returns `None` when the season has no sections; callers then render the
/// flat main list instead.
pub fn build_section_tree(season: &Season) -> Option<Vec<VideoSection>> {
    if season.sections.is_empty() {
        return None;
    }

    let mut tree = Vec::with_capacity(season.sections.len() + 1);
    tree.push(VideoSection {
        id: season.positive.id,
        title: season.positive.title.clone(),
        is_selected: true,
        pages: build_main_page_list(season),
    });

    tree.extend(season.sections.iter().map(|section| VideoSection {
        id: section.id,
        title: section.title.clone(),
        is_selected: false,
        pages: build_pages(&section.episodes, section_episode_name),
    }));

    debug!(
        season_id = season.season_id,
        sections = tree.len(),
        "Built section tree"
    );
    Some(tree)
}

/// Display name for an episode of the main list.
pub fn main_episode_name(episode: &Episode) -> String {
    if is_integer_title(&episode.title) {
        episode.share_copy.clone()
    } else {
        section_episode_name(episode)
    }
}

/// Display name for an episode of an auxiliary section.
pub fn section_episode_name(episode: &Episode) -> String {
    match episode.long_title.as_deref() {
        Some(long) if !long.is_empty() => format!("{} {}", episode.title, long),
        _ => episode.title.clone(),
    }
}

/// Whether the title is nothing but a 32-bit integer ("1", "12", " -3 ").
///
/// Only ASCII whitespace around the number is ignored; a full-width space
/// makes the title non-numeric.
fn is_integer_title(title: &str) -> bool {
    title
        .trim_matches(|c: char| matches!(c, '\t'..='\r' | ' '))
        .parse::<i32>()
        .is_ok()
}

fn build_pages(episodes: &[Episode], name: fn(&Episode) -> String) -> Vec<VideoPage> {
    episodes
        .iter()
        .enumerate()
        .map(|(i, episode)| VideoPage {
            avid: episode.aid,
            bvid: episode.bvid.clone(),
            cid: episode.cid,
            episode_id: UNSET_EPISODE_ID,
            order: i + 1,
            name: name(episode),
            duration: DURATION_PLACEHOLDER.to_string(),
            stream: None,
        })
        .collect()
}
