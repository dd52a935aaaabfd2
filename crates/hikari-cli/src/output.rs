//! Plain-text rendering of service results.

use std::fmt::Write;

use hikari_core::models::{StreamInfo, VideoInfoView, VideoPage, VideoSection};

pub fn render_pages(pages: &[VideoPage]) -> String {
    let mut out = String::new();
    for page in pages {
        let _ = writeln!(
            out,
            "{:>3}  {}  [{}]  av{} {} cid:{}",
            page.order, page.name, page.duration, page.avid, page.bvid, page.cid
        );
    }
    out
}

pub fn render_sections(sections: &[VideoSection]) -> String {
    let mut out = String::new();
    for section in sections {
        let marker = if section.is_selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {} (#{}, {} episodes)",
            section.title,
            section.id,
            section.pages.len()
        );
        for line in render_pages(&section.pages).lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

pub fn render_stream(page: &VideoPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", page.name, page.duration);
    let Some(stream) = &page.stream else {
        return out;
    };

    let _ = writeln!(out, "quality: {}", quality_label(stream, stream.quality));
    for s in &stream.video {
        let _ = writeln!(
            out,
            "video  {:<12} {}x{} {} kbps  {}",
            quality_label(stream, s.id),
            s.width,
            s.height,
            s.bandwidth / 1000,
            s.codecs
        );
    }
    for s in &stream.audio {
        let _ = writeln!(out, "audio  {:<12} {} kbps  {}", s.id, s.bandwidth / 1000, s.codecs);
    }
    out
}

pub fn render_view(view: &VideoInfoView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", view.title, view.video_zone);
    if !view.up_name.is_empty() {
        let _ = writeln!(out, "up: {}", view.up_name);
    }
    let _ = writeln!(
        out,
        "play {}  danmaku {}  like {}  coin {}  favorite {}  share {}  reply {}",
        view.play_number,
        view.danmaku_number,
        view.like_number,
        view.coin_number,
        view.favorite_number,
        view.share_number,
        view.reply_number
    );
    match &view.cover {
        Some(path) => {
            let _ = writeln!(out, "cover: {}", path.display());
        }
        None => {
            let _ = writeln!(out, "cover: {}", view.cover_url);
        }
    }
    if !view.description.is_empty() {
        let _ = writeln!(out, "\n{}", view.description);
    }
    out
}

fn quality_label(stream: &StreamInfo, id: i32) -> String {
    stream
        .qualities
        .iter()
        .find(|q| q.id == id)
        .map(|q| q.description.clone())
        .unwrap_or_else(|| id.to_string())
}
