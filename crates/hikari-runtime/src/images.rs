//! Cover and avatar image cache.
//!
//! Images are downloaded once into the cache directory, named by the SHA-256
//! of their URL, and tracked in the SQLite index. A lookup whose record is
//! missing, points at another URL, or whose file was deleted downloads again.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::imageops::FilterType;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use hikari_core::error::HikariError;
use hikari_core::models::Thumbnail;
use hikari_core::storage::{CoverRecord, HeaderRecord};

use crate::db::IndexHandle;

const INDEX_FILE: &str = "images.db";

/// Image lookups needed to build a season view. Every miss is `None`.
pub trait ImageStore: Send + Sync {
    /// Local path of a cover keyed by owner id, source kind and episode index.
    fn get_cover(
        &self,
        owner_id: i64,
        source_kind: &str,
        index: i64,
        url: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Local path of an uploader avatar.
    fn get_header(
        &self,
        mid: i64,
        name: &str,
        url: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send;

    /// Decode a cached avatar and scale it to `width` x `height`.
    fn header_thumbnail(
        &self,
        path: &Path,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Option<Thumbnail>> + Send;
}

/// On-disk image cache backed by the SQLite index.
#[derive(Clone)]
pub struct ImageCache {
    index: IndexHandle,
    http: Client,
    dir: PathBuf,
}

impl ImageCache {
    /// Open the cache rooted at `dir`, creating it if needed.
    pub fn open(dir: PathBuf, http: Client) -> Result<Self, HikariError> {
        std::fs::create_dir_all(&dir)?;
        let index = IndexHandle::open(&dir.join(INDEX_FILE))?;
        Ok(Self { index, http, dir })
    }

    /// Cache with an in-memory index; files still go to `dir`.
    pub fn with_memory_index(dir: PathBuf, http: Client) -> Result<Self, HikariError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            index: IndexHandle::open_memory()?,
            http,
            dir,
        })
    }

    /// Download `url` into the cache directory. Returns (digest, path).
    async fn download(&self, url: &str) -> Result<(String, PathBuf), DownloadError> {
        let digest = url_digest(url);
        let path = self.dir.join(format!("{digest}.{}", extension_of(url)));

        let resp = self.http.get(url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;
        tokio::fs::write(&path, &bytes).await?;

        debug!(url, path = %path.display(), bytes = bytes.len(), "Cached image");
        Ok((digest, path))
    }

    async fn lookup_cover(
        &self,
        owner_id: i64,
        source_kind: &str,
        index: i64,
        url: &str,
    ) -> Result<PathBuf, DownloadError> {
        if let Some(record) = self.index.get_cover(owner_id, source_kind, index).await? {
            if record.url == url && record.path.exists() {
                return Ok(record.path);
            }
        }

        let (digest, path) = self.download(url).await?;
        self.index
            .upsert_cover(CoverRecord {
                owner_id,
                source_kind: source_kind.to_string(),
                index,
                url: url.to_string(),
                digest,
                path: path.clone(),
                cached_at: Utc::now(),
            })
            .await?;
        Ok(path)
    }

    async fn lookup_header(&self, mid: i64, name: &str, url: &str) -> Result<PathBuf, DownloadError> {
        if let Some(record) = self.index.get_header(mid).await? {
            if record.url == url && record.path.exists() {
                if record.name != name {
                    self.index
                        .upsert_header(HeaderRecord {
                            name: name.to_string(),
                            ..record.clone()
                        })
                        .await?;
                }
                return Ok(record.path);
            }
        }

        let (digest, path) = self.download(url).await?;
        self.index
            .upsert_header(HeaderRecord {
                mid,
                name: name.to_string(),
                url: url.to_string(),
                digest,
                path: path.clone(),
                cached_at: Utc::now(),
            })
            .await?;
        Ok(path)
    }
}

impl ImageStore for ImageCache {
    async fn get_cover(
        &self,
        owner_id: i64,
        source_kind: &str,
        index: i64,
        url: &str,
    ) -> Option<PathBuf> {
        if url.is_empty() {
            return None;
        }
        self.lookup_cover(owner_id, source_kind, index, url)
            .await
            .map_err(|e| warn!(owner_id, source_kind, url, "Cover unavailable: {e}"))
            .ok()
    }

    async fn get_header(&self, mid: i64, name: &str, url: &str) -> Option<PathBuf> {
        if url.is_empty() {
            return None;
        }
        self.lookup_header(mid, name, url)
            .await
            .map_err(|e| warn!(mid, url, "Avatar unavailable: {e}"))
            .ok()
    }

    async fn header_thumbnail(&self, path: &Path, width: u32, height: u32) -> Option<Thumbnail> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || make_thumbnail(&path, width, height))
            .await
            .map_err(|e| warn!("Thumbnail task failed: {e}"))
            .ok()?
            .map_err(|e| warn!("Thumbnail unavailable: {e}"))
            .ok()
    }
}

#[derive(Debug, thiserror::Error)]
enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Cache(#[from] HikariError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode an image file and scale it to exactly `width` x `height`.
pub fn make_thumbnail(path: &Path, width: u32, height: u32) -> Result<Thumbnail, HikariError> {
    let img = image::open(path).map_err(|e| HikariError::Image(e.to_string()))?;
    let scaled = img.resize_exact(width, height, FilterType::Lanczos3).to_rgba8();
    Ok(Thumbnail {
        width: scaled.width(),
        height: scaled.height(),
        rgba: scaled.into_raw(),
    })
}

fn url_digest(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// File extension of the image at `url`, ignoring any query string.
fn extension_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((_, ext)) if matches!(ext, "jpg" | "jpeg" | "png" | "webp" | "gif") => ext,
        _ => "jpg",
    }
}
