use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::HikariError;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_image_cache.sql");

/// A cached cover, keyed by owner, source kind and episode index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverRecord {
    pub owner_id: i64,
    pub source_kind: String,
    /// Episode index; `-1` for the season cover itself.
    pub index: i64,
    pub url: String,
    /// Hex SHA-256 of `url`, also the file stem.
    pub digest: String,
    pub path: PathBuf,
    pub cached_at: DateTime<Utc>,
}

/// A cached uploader avatar, keyed by uploader id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub mid: i64,
    pub name: String,
    pub url: String,
    pub digest: String,
    pub path: PathBuf,
    pub cached_at: DateTime<Utc>,
}

/// SQLite index of downloaded cover and avatar images.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the index at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, HikariError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory index (for tests).
    pub fn open_memory() -> Result<Self, HikariError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Covers ──────────────────────────────────────────────────

    pub fn get_cover(
        &self,
        owner_id: i64,
        source_kind: &str,
        index: i64,
    ) -> Result<Option<CoverRecord>, HikariError> {
        self.conn
            .query_row(
                "SELECT owner_id, source_kind, idx, url, digest, path, cached_at
                 FROM cover WHERE owner_id = ?1 AND source_kind = ?2 AND idx = ?3",
                params![owner_id, source_kind, index],
                row_to_cover,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert or replace the cover for its (owner, kind, index) key.
    pub fn upsert_cover(&self, record: &CoverRecord) -> Result<(), HikariError> {
        self.conn.execute(
            "INSERT INTO cover (owner_id, source_kind, idx, url, digest, path, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(owner_id, source_kind, idx) DO UPDATE SET
                url = excluded.url,
                digest = excluded.digest,
                path = excluded.path,
                cached_at = excluded.cached_at",
            params![
                record.owner_id,
                record.source_kind,
                record.index,
                record.url,
                record.digest,
                record.path.to_string_lossy().into_owned(),
                record.cached_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ── Headers ─────────────────────────────────────────────────

    pub fn get_header(&self, mid: i64) -> Result<Option<HeaderRecord>, HikariError> {
        self.conn
            .query_row(
                "SELECT mid, name, url, digest, path, cached_at FROM header WHERE mid = ?1",
                params![mid],
                row_to_header,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn upsert_header(&self, record: &HeaderRecord) -> Result<(), HikariError> {
        self.conn.execute(
            "INSERT INTO header (mid, name, url, digest, path, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(mid) DO UPDATE SET
                name = excluded.name,
                url = excluded.url,
                digest = excluded.digest,
                path = excluded.path,
                cached_at = excluded.cached_at",
            params![
                record.mid,
                record.name,
                record.url,
                record.digest,
                record.path.to_string_lossy().into_owned(),
                record.cached_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn run_migrations(conn: &Connection) -> Result<(), HikariError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

fn row_to_cover(row: &Row<'_>) -> rusqlite::Result<CoverRecord> {
    Ok(CoverRecord {
        owner_id: row.get(0)?,
        source_kind: row.get(1)?,
        index: row.get(2)?,
        url: row.get(3)?,
        digest: row.get(4)?,
        path: PathBuf::from(row.get::<_, String>(5)?),
        cached_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn row_to_header(row: &Row<'_>) -> rusqlite::Result<HeaderRecord> {
    Ok(HeaderRecord {
        mid: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        digest: row.get(3)?,
        path: PathBuf::from(row.get::<_, String>(4)?),
        cached_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
