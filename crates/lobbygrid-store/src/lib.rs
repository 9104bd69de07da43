// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod paths;

pub use paths::*;

use anyhow::{Context, Result, anyhow, bail};
use lobbygrid_app::PrefsStore;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const PREFS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS prefs (
  namespace TEXT NOT NULL,
  key TEXT NOT NULL,
  value TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  PRIMARY KEY (namespace, key)
);
";

const REQUIRED_COLUMNS: &[&str] = &["namespace", "key", "value", "updated_at"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPref {
    pub key: String,
    pub value: i64,
    pub updated_at: OffsetDateTime,
}

/// SQLite-backed preferences. One row per `(namespace, key)`.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_prefs_path(&printable)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create preferences directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open preferences at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory preferences")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_prefs_table(&self.conn)? {
            validate_schema(&self.conn)?;
            return Ok(());
        }

        self.conn
            .execute_batch(PREFS_SCHEMA)
            .context("create preferences schema")?;
        log::debug!("created preferences schema");
        Ok(())
    }

    pub fn list_prefs(&self, namespace: &str) -> Result<Vec<StoredPref>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT key, value, updated_at FROM prefs WHERE namespace = ? ORDER BY key ASC",
            )
            .context("prepare preferences listing")?;
        let rows = stmt
            .query_map(params![namespace], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .with_context(|| format!("list preferences in {namespace}"))?;

        let mut prefs = Vec::new();
        for row in rows {
            let (key, raw_value, raw_updated_at) = row.context("decode preference row")?;
            prefs.push(StoredPref {
                value: parse_value(namespace, &key, &raw_value)?,
                updated_at: OffsetDateTime::parse(&raw_updated_at, &Rfc3339).with_context(
                    || format!("pref {namespace}/{key} has invalid updated_at {raw_updated_at:?}"),
                )?,
                key,
            });
        }
        Ok(prefs)
    }

    pub fn namespaces(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT namespace FROM prefs ORDER BY namespace ASC")
            .context("prepare namespace listing")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("list preference namespaces")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("decode preference namespace")
    }

    /// Forgets every preference of one table. Returns the number removed.
    pub fn reset_namespace(&self, namespace: &str) -> Result<usize> {
        self.conn
            .execute("DELETE FROM prefs WHERE namespace = ?", params![namespace])
            .with_context(|| format!("reset preferences in {namespace}"))
    }

    fn get_pref_raw(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM prefs WHERE namespace = ? AND key = ?",
                params![namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read pref {namespace}/{key}"))
    }

    fn put_pref_raw(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO prefs (namespace, key, value, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(namespace, key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![namespace, key, value, now],
            )
            .with_context(|| format!("upsert pref {namespace}/{key}"))?;
        Ok(())
    }
}

impl PrefsStore for Store {
    fn get_int(&self, namespace: &str, key: &str) -> Result<Option<i64>> {
        self.get_pref_raw(namespace, key)?
            .map(|raw| parse_value(namespace, key, &raw))
            .transpose()
    }

    fn set_int(&self, namespace: &str, key: &str, value: i64) -> Result<()> {
        self.put_pref_raw(namespace, key, &value.to_string())
    }
}

fn parse_value(namespace: &str, key: &str, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        anyhow!(
            "pref `{namespace}/{key}` has invalid value `{raw}`; run `lobbygrid --reset-prefs {namespace}` to restore defaults"
        )
    })
}

fn has_prefs_table(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'prefs'",
            [],
            |row| row.get(0),
        )
        .context("inspect preferences schema")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(prefs)")
        .context("read preferences table info")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("list preferences columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("decode preferences columns")?;

    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|column| column == required) {
            bail!(
                "preferences table is missing column `{required}`; move the preferences file aside and restart to recreate it"
            );
        }
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
