//! SQLite-backed [`ExemplarStore`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use deckstyle_core::normalize::normalize_keywords;
use deckstyle_core::{DesignExemplar, Error, ExemplarScope, ExtractedDesign, NewExemplar, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{migrations, ExemplarStore};

const COLUMNS: &str = "id, category_tag, keywords, extracted_spec, quality_score, \
                       usage_count, uploaded_by, image_ref, created_at";

/// Candidate ordering: best stored quality, then most used, then newest.
const RANKED_ORDER: &str =
    "COALESCE(quality_score, -1) DESC, usage_count DESC, created_at DESC, rowid DESC";

fn to_store_err(e: impl std::fmt::Display) -> Error {
    Error::Store(e.to_string())
}

/// A row as stored, before JSON columns are decoded.
struct RawExemplar {
    id: String,
    category_tag: String,
    keywords: String,
    extracted_spec: Option<String>,
    quality_score: Option<i64>,
    usage_count: i64,
    uploaded_by: Option<String>,
    image_ref: Option<String>,
    created_at: String,
}

fn row_to_raw(row: &Row) -> rusqlite::Result<RawExemplar> {
    Ok(RawExemplar {
        id: row.get("id")?,
        category_tag: row.get("category_tag")?,
        keywords: row.get("keywords")?,
        extracted_spec: row.get("extracted_spec")?,
        quality_score: row.get("quality_score")?,
        usage_count: row.get("usage_count")?,
        uploaded_by: row.get("uploaded_by")?,
        image_ref: row.get("image_ref")?,
        created_at: row.get("created_at")?,
    })
}

impl RawExemplar {
    /// Decode JSON columns and range-check numbers.
    fn decode(self) -> std::result::Result<DesignExemplar, String> {
        let keywords: Vec<String> = serde_json::from_str(&self.keywords)
            .map_err(|e| format!("keywords is not a list of strings: {}", e))?;

        let extracted_spec = match self.extracted_spec.as_deref() {
            None | Some("") | Some("null") => None,
            Some(json) => Some(
                serde_json::from_str::<ExtractedDesign>(json)
                    .map_err(|e| format!("extracted_spec is malformed: {}", e))?,
            ),
        };

        let quality_score = match self.quality_score {
            None => None,
            Some(q @ 0..=100) => Some(q as u8),
            Some(q) => return Err(format!("quality_score {} out of range", q)),
        };

        let usage_count = u32::try_from(self.usage_count)
            .map_err(|_| format!("usage_count {} invalid", self.usage_count))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| format!("created_at is not RFC 3339: {}", e))?
            .with_timezone(&Utc);

        Ok(DesignExemplar {
            id: self.id,
            category_tag: self.category_tag,
            keywords,
            extracted_spec,
            quality_score,
            usage_count,
            uploaded_by: self.uploaded_by,
            image_ref: self.image_ref,
            created_at,
        })
    }
}

/// Decode rows, skipping (and logging) malformed records.
fn decode_rows(rows: Vec<RawExemplar>) -> Vec<DesignExemplar> {
    rows.into_iter().filter_map(decode_or_skip).collect()
}

fn decode_or_skip(raw: RawExemplar) -> Option<DesignExemplar> {
    let id = raw.id.clone();
    match raw.decode() {
        Ok(exemplar) => Some(exemplar),
        Err(reason) => {
            log::warn!("Skipping malformed exemplar {}: {}", id, reason);
            None
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn spec_to_json(spec: Option<&ExtractedDesign>) -> Result<Option<String>> {
    spec.map(serde_json::to_string)
        .transpose()
        .map_err(to_store_err)
}

/// Exemplar store over a single SQLite connection.
pub struct SqliteExemplarStore {
    conn: Mutex<Connection>,
}

impl SqliteExemplarStore {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(to_store_err)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(to_store_err)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests, one-off runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(to_store_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::run(&conn).map_err(to_store_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("connection lock poisoned".to_string()))
    }

    fn query_raw(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<RawExemplar>> {
        let mut stmt = conn.prepare(sql).map_err(to_store_err)?;
        let rows = stmt
            .query_map(params, row_to_raw)
            .map_err(to_store_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(to_store_err)?;
        Ok(rows)
    }

    /// Insert an exemplar with a given creation time.
    pub fn insert_at(&self, new: NewExemplar, created_at: DateTime<Utc>) -> Result<DesignExemplar> {
        let exemplar = DesignExemplar {
            id: uuid::Uuid::new_v4().to_string(),
            category_tag: new.category_tag.trim().to_string(),
            keywords: normalize_keywords(&new.keywords),
            extracted_spec: new.extracted_spec,
            quality_score: new.quality_score.map(|q| q.min(100)),
            usage_count: 0,
            uploaded_by: new.uploaded_by,
            image_ref: new.image_ref,
            created_at,
        };

        let keywords = serde_json::to_string(&exemplar.keywords).map_err(to_store_err)?;
        let spec = spec_to_json(exemplar.extracted_spec.as_ref())?;

        self.conn()?
            .execute(
                &format!(
                    "INSERT INTO design_exemplars ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    COLUMNS
                ),
                params![
                    exemplar.id,
                    exemplar.category_tag,
                    keywords,
                    spec,
                    exemplar.quality_score,
                    exemplar.usage_count,
                    exemplar.uploaded_by,
                    exemplar.image_ref,
                    format_timestamp(&exemplar.created_at),
                ],
            )
            .map_err(to_store_err)?;

        log::debug!(
            "Inserted exemplar {} ({}, {} keywords)",
            exemplar.id,
            exemplar.category_tag,
            exemplar.keywords.len()
        );
        Ok(exemplar)
    }

    /// Number of stored exemplars, malformed rows included.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM design_exemplars", [], |row| row.get(0))
            .map_err(to_store_err)?;
        Ok(n as usize)
    }
}

impl ExemplarStore for SqliteExemplarStore {
    fn insert(&self, new: NewExemplar) -> Result<DesignExemplar> {
        self.insert_at(new, Utc::now())
    }

    fn get(&self, id: &str) -> Result<Option<DesignExemplar>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM design_exemplars WHERE id = ?1", COLUMNS),
                params![id],
                row_to_raw,
            )
            .optional()
            .map_err(to_store_err)?;

        match raw {
            None => Ok(None),
            Some(raw) => raw.decode().map(Some).map_err(Error::Store),
        }
    }

    fn update(&self, exemplar: &DesignExemplar) -> Result<()> {
        let keywords =
            serde_json::to_string(&normalize_keywords(&exemplar.keywords)).map_err(to_store_err)?;
        let spec = spec_to_json(exemplar.extracted_spec.as_ref())?;

        let changed = self
            .conn()?
            .execute(
                "UPDATE design_exemplars
                 SET category_tag = ?2, keywords = ?3, extracted_spec = ?4,
                     quality_score = ?5, usage_count = ?6, uploaded_by = ?7, image_ref = ?8
                 WHERE id = ?1",
                params![
                    exemplar.id,
                    exemplar.category_tag,
                    keywords,
                    spec,
                    exemplar.quality_score.map(|q| q.min(100)),
                    exemplar.usage_count,
                    exemplar.uploaded_by,
                    exemplar.image_ref,
                ],
            )
            .map_err(to_store_err)?;

        if changed == 0 {
            return Err(Error::Store(format!("exemplar {} not found", exemplar.id)));
        }
        Ok(())
    }

    fn candidates(&self, scope: &ExemplarScope, cap: usize) -> Result<Vec<DesignExemplar>> {
        let conn = self.conn()?;
        let cap = i64::try_from(cap).unwrap_or(i64::MAX);

        let set_category = scope.set_id.as_deref().map(deckstyle_core::types::set_category);
        let uploader = scope.uploader_id.as_deref();

        let rows = match (set_category.as_deref(), uploader) {
            (Some(category), Some(uploader)) => Self::query_raw(
                &conn,
                &format!(
                    "SELECT {} FROM design_exemplars WHERE category_tag = ?1
                     ORDER BY (uploaded_by IS ?2) DESC, {} LIMIT ?3",
                    COLUMNS, RANKED_ORDER
                ),
                params![category, uploader, cap],
            )?,
            (Some(category), None) => Self::query_raw(
                &conn,
                &format!(
                    "SELECT {} FROM design_exemplars WHERE category_tag = ?1
                     ORDER BY {} LIMIT ?2",
                    COLUMNS, RANKED_ORDER
                ),
                params![category, cap],
            )?,
            (None, Some(uploader)) => Self::query_raw(
                &conn,
                &format!(
                    "SELECT {} FROM design_exemplars
                     ORDER BY (uploaded_by IS ?1) DESC, {} LIMIT ?2",
                    COLUMNS, RANKED_ORDER
                ),
                params![uploader, cap],
            )?,
            (None, None) => Self::query_raw(
                &conn,
                &format!(
                    "SELECT {} FROM design_exemplars ORDER BY {} LIMIT ?1",
                    COLUMNS, RANKED_ORDER
                ),
                params![cap],
            )?,
        };

        Ok(decode_rows(rows))
    }

    fn latest_with_category_prefix(&self, prefix: &str) -> Result<Option<DesignExemplar>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM design_exemplars
                 WHERE substr(category_tag, 1, length(?1)) = ?1
                 ORDER BY created_at DESC, rowid DESC",
                COLUMNS
            ))
            .map_err(to_store_err)?;
        let rows = stmt
            .query_map(params![prefix], row_to_raw)
            .map_err(to_store_err)?;

        // Newest well-formed record wins; stop reading once it is found
        for row in rows {
            if let Some(exemplar) = decode_or_skip(row.map_err(to_store_err)?) {
                return Ok(Some(exemplar));
            }
        }
        Ok(None)
    }

    fn list_by_category(&self, category_tag: &str) -> Result<Vec<DesignExemplar>> {
        let conn = self.conn()?;
        let rows = Self::query_raw(
            &conn,
            &format!(
                "SELECT {} FROM design_exemplars WHERE category_tag = ?1
                 ORDER BY created_at ASC, rowid ASC",
                COLUMNS
            ),
            params![category_tag],
        )?;
        Ok(decode_rows(rows))
    }

    fn increment_usage(&self, id: &str) -> Result<Option<u32>> {
        // Read-modify-write: concurrent increments may lose updates.
        let conn = self.conn()?;
        let current: Option<i64> = conn
            .query_row(
                "SELECT usage_count FROM design_exemplars WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_store_err)?;

        let Some(current) = current else {
            return Ok(None);
        };
        let next = current.max(0).saturating_add(1);

        conn.execute(
            "UPDATE design_exemplars SET usage_count = ?2 WHERE id = ?1",
            params![id, next],
        )
        .map_err(to_store_err)?;

        Ok(Some(u32::try_from(next).unwrap_or(u32::MAX)))
    }
}
