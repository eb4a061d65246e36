//! Idempotent schema setup.

use rusqlite::Connection;

/// Create tables and indexes if they do not exist yet.
pub fn run(conn: &Connection) -> rusqlite::Result<()> {
    log::debug!("Running exemplar store migrations");
    conn.execute_batch(SCHEMA)
}

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- keywords and extracted_spec hold JSON text
CREATE TABLE IF NOT EXISTS design_exemplars (
    id              TEXT PRIMARY KEY,
    category_tag    TEXT NOT NULL DEFAULT 'general',
    keywords        TEXT NOT NULL DEFAULT '[]',
    extracted_spec  TEXT,
    quality_score   INTEGER,
    usage_count     INTEGER NOT NULL DEFAULT 0,
    uploaded_by     TEXT,
    image_ref       TEXT,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_design_exemplars_category ON design_exemplars(category_tag);
CREATE INDEX IF NOT EXISTS idx_design_exemplars_created ON design_exemplars(created_at);
CREATE INDEX IF NOT EXISTS idx_design_exemplars_uploader ON design_exemplars(uploaded_by);
"#;
