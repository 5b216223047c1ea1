//! Interaction store.
//!
//! Append-only log of [`Interaction`] documents. The SQLite backend keeps
//! each record as a JSON document keyed by a store-assigned row id; nothing
//! in this crate updates or deletes rows.

use crate::interaction::Interaction;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Store acknowledgement for a durable write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Store-assigned identifier
    pub id: i64,
}

/// Store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write was not acknowledged by the store")]
    NotAcknowledged,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to encode interaction: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to open store at {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("store worker failed: {0}")]
    Worker(String),
}

/// Destination for interaction records
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Append one record. Succeeds only on an acknowledged write.
    async fn append(&self, record: &Interaction) -> Result<Ack, StoreError>;

    /// Number of stored records
    async fn count(&self) -> Result<u64, StoreError>;
}

// ============================================================================
// SQLite
// ============================================================================

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteInteractionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInteractionStore {
    /// Open from a connection string: `sqlite://<path>`, `sqlite::memory:`,
    /// `:memory:` or a bare path.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let target = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if target == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(target))
        }
    }

    /// Open or create the store at a specific path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Open {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        info!("Interaction store opened at {:?}", path);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
        conn.lock()
            .map_err(|_| StoreError::Worker("connection lock poisoned".to_string()))
    }

    /// Insert on the calling thread
    pub fn append_blocking(&self, record: &Interaction) -> Result<Ack, StoreError> {
        let document = serde_json::to_string(record)?;
        let conn = Self::lock(&self.conn)?;

        let changed = conn.execute(
            "INSERT INTO interactions (document, created_at) VALUES (?, ?)",
            params![document, record.timestamp.to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();

        if changed != 1 || id <= 0 {
            return Err(StoreError::NotAcknowledged);
        }

        debug!("Stored interaction {} ({})", id, record.intent);
        Ok(Ack { id })
    }

    pub fn count_blocking(&self) -> Result<u64, StoreError> {
        let conn = Self::lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Fetch a stored record by id
    pub fn get(&self, id: i64) -> Result<Option<Interaction>, StoreError> {
        let conn = Self::lock(&self.conn)?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM interactions WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl InteractionStore for SqliteInteractionStore {
    async fn append(&self, record: &Interaction) -> Result<Ack, StoreError> {
        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.append_blocking(&record))
            .await
            .map_err(|e| StoreError::Worker(e.to_string()))?
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.count_blocking())
            .await
            .map_err(|e| StoreError::Worker(e.to_string()))?
    }
}

// ============================================================================
// In-memory (testing)
// ============================================================================

/// In-memory store that records every append attempt
#[derive(Default)]
pub struct MemoryInteractionStore {
    records: Mutex<Vec<Interaction>>,
    attempts: Mutex<usize>,
    refuse_writes: bool,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes are never acknowledged
    pub fn unacknowledged() -> Self {
        Self {
            refuse_writes: true,
            ..Self::default()
        }
    }

    /// Number of append calls, acknowledged or not
    pub fn append_calls(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn records(&self) -> Vec<Interaction> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl InteractionStore for MemoryInteractionStore {
    async fn append(&self, record: &Interaction) -> Result<Ack, StoreError> {
        *self.attempts.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        if self.refuse_writes {
            return Err(StoreError::NotAcknowledged);
        }

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(record.clone());
        Ok(Ack {
            id: records.len() as i64,
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.lock().unwrap_or_else(|e| e.into_inner()).len() as u64)
    }
}
