// Copyright 2026 Pracsite Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Durable string storage for the video cache and visit history.
//!
//! One SQLite file holds a single `kv` table; the schema revision lives in
//! `PRAGMA user_version`. A sibling `<store>.lock` file is held exclusively
//! for as long as a [`Store`] is open.

use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use fs2::FileExt;
use log::debug;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Serialize;

const SCHEMA_VERSION: i64 = 1;
const LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_POLL: Duration = Duration::from_millis(50);

/// String key-value storage with no expiry of its own.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<bool>;
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub entry_count: i64,
    pub db_size_bytes: u64,
}

pub struct Store {
    conn: Connection,
    path: PathBuf,
    _lock: File,
}

impl Store {
    /// Create a new, empty store file. Fails if one is already there.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("store already exists at {}", path.display());
        }
        Self::connect(path).map(drop)
    }

    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("store not found at {}", path.display());
        }
        Self::connect(path)
    }

    fn connect(path: &Path) -> Result<Self> {
        let lock = lock_store(path)?;
        let conn =
            Connection::open(path).with_context(|| format!("open store {}", path.display()))?;
        conn.busy_timeout(LOCK_WAIT).context("set busy timeout")?;
        prepare_schema(&conn)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    pub fn count_with_prefix(&self, prefix: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM kv WHERE substr(key, 1, length(?1)) = ?1",
                params![prefix],
                |row| row.get(0),
            )
            .with_context(|| format!("count keys under {prefix}"))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let entry_count = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .context("count entries")?;
        let db_size_bytes = std::fs::metadata(&self.path)
            .with_context(|| format!("stat {}", self.path.display()))?
            .len();
        Ok(StoreStats {
            entry_count,
            db_size_bytes,
        })
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Take the exclusive store lock, polling until [`LOCK_WAIT`] runs out.
fn lock_store(path: &Path) -> Result<File> {
    let lock_path = lock_path(path);
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("open lock file {}", lock_path.display()))?;
    let deadline = Instant::now() + LOCK_WAIT;
    while let Err(err) = file.try_lock_exclusive() {
        if Instant::now() >= deadline {
            return Err(err).with_context(|| {
                format!("store {} is in use by another pracsite process", path.display())
            });
        }
        sleep(LOCK_POLL);
    }
    Ok(file)
}

fn prepare_schema(conn: &Connection) -> Result<()> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("read store version")?;
    match version {
        SCHEMA_VERSION => Ok(()),
        0 => {
            debug!("creating store schema v{SCHEMA_VERSION}");
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL);
                 PRAGMA user_version = {SCHEMA_VERSION};"
            ))
            .context("create store schema")
        }
        newer => anyhow::bail!(
            "store version {newer} is newer than this pracsite supports ({SCHEMA_VERSION})"
        ),
    }
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("read key {key}"))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("write key {key}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("remove key {key}"))?;
        Ok(removed > 0)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        // substr comparison keeps `_` and `%` in prefixes literal.
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("list keys under {prefix}"))?;
        Ok(keys)
    }
}

/// In-memory store for tests; `fail_writes` makes every `set` error.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub entries: std::cell::RefCell<std::collections::BTreeMap<String, String>>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("quota exceeded");
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .borrow()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
