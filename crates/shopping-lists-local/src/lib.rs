//! Local file record store.
//!
//! All records live in one JSON document under the data directory:
//! ```text
//! {data_dir}/
//! ├── records.json   # records grouped by record type
//! └── records.lock   # held exclusively for the duration of each operation
//! ```
//! Writes go to a temp file that is renamed over `records.json`, so a crash
//! never leaves a half-written document behind.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use shopping_lists_core::{
    sort_by_name, Identity, ListRecord, RecordError, RecordId, RecordService, SavedList,
    SORT_KEY_NAME,
};
use tracing::{debug, instrument};

const RECORDS_FILE: &str = "records.json";
const LOCK_FILE: &str = "records.lock";

/// Record type under which user identities are kept.
pub const RECORD_TYPE_USERS: &str = "Users";

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    #[serde(default)]
    records: BTreeMap<String, Vec<StoredRecord>>,
    /// Set by every mutation; only a dirty document is written back.
    #[serde(skip)]
    dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl StoredRecord {
    fn to_saved(&self) -> SavedList {
        SavedList::new(RecordId::new(self.id.clone()), self.name.clone())
    }
}

impl RecordFile {
    fn find(&self, id: &str) -> Option<&StoredRecord> {
        self.records
            .values()
            .flat_map(|records| records.iter())
            .find(|r| r.id == id)
    }

    fn rename(&mut self, record_type: &str, id: &str, name: String) -> Option<SavedList> {
        let stored = self
            .records
            .get_mut(record_type)?
            .iter_mut()
            .find(|r| r.id == id)?;
        stored.name = name;
        stored.modified_at = Utc::now();
        let saved = stored.to_saved();
        self.dirty = true;
        Some(saved)
    }

    fn remove(&mut self, id: &str) -> bool {
        for records in self.records.values_mut() {
            if let Some(index) = records.iter().position(|r| r.id == id) {
                records.remove(index);
                self.dirty = true;
                return true;
            }
        }
        false
    }

    fn insert(&mut self, record_type: &str, name: &str) -> StoredRecord {
        let now = Utc::now();
        let record = StoredRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
            modified_at: now,
        };
        self.records
            .entry(record_type.to_string())
            .or_default()
            .push(record.clone());
        self.dirty = true;
        record
    }
}

/// File-backed [`RecordService`].
#[derive(Debug, Clone)]
pub struct LocalRecordService {
    data_dir: PathBuf,
}

impl LocalRecordService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Store under the platform data directory (`~/.local/share/shopping-lists`
    /// on Linux).
    pub fn with_default_dir() -> Self {
        Self::new(default_data_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run `op` against the record document while holding the lock file.
    ///
    /// The document is written back only when `op` succeeded and changed it.
    async fn with_records<T, F>(&self, op: F) -> Result<T, RecordError>
    where
        T: Send + 'static,
        F: FnOnce(&mut RecordFile) -> Result<T, RecordError> + Send + 'static,
    {
        let dir = self.data_dir.clone();
        tokio::task::spawn_blocking(move || -> Result<T, RecordError> {
            fs::create_dir_all(&dir).map_err(|e| io_error("create data dir", e))?;

            let lock = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(dir.join(LOCK_FILE))
                .map_err(|e| io_error("open lock file", e))?;
            lock.lock_exclusive()
                .map_err(|e| io_error("lock records", e))?;

            let path = dir.join(RECORDS_FILE);
            let mut document = read_document(&path)?;
            let value = op(&mut document)?;
            if document.dirty {
                write_document(&dir, &path, &document)?;
            }

            // Closing the lock file releases the lock.
            drop(lock);
            Ok(value)
        })
        .await
        .map_err(|e| RecordError::Transport(format!("Storage task failed: {}", e)))?
    }
}

#[async_trait]
impl RecordService for LocalRecordService {
    #[instrument(skip(self), level = "debug")]
    async fn query_all(
        &self,
        record_type: &str,
        sort_key: &str,
    ) -> Result<Vec<SavedList>, RecordError> {
        if sort_key != SORT_KEY_NAME {
            return Err(RecordError::Transport(format!(
                "Unsupported sort key: {}",
                sort_key
            )));
        }

        let record_type = record_type.to_string();
        let mut records = self
            .with_records(move |doc| {
                Ok(doc
                    .records
                    .get(&record_type)
                    .map(|records| {
                        records
                            .iter()
                            .map(StoredRecord::to_saved)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default())
            })
            .await?;

        sort_by_name(&mut records);
        debug!("Queried {} records", records.len());
        Ok(records)
    }

    #[instrument(skip(self, record), level = "debug", fields(id = ?record.id()))]
    async fn save(
        &self,
        record_type: &str,
        record: &ListRecord,
    ) -> Result<SavedList, RecordError> {
        let record_type = record_type.to_string();
        let record = record.clone();

        self.with_records(move |doc| match record {
            ListRecord::Unsaved { name } => Ok(doc.insert(&record_type, &name).to_saved()),
            ListRecord::Saved(list) => doc
                .rename(&record_type, list.id.as_str(), list.name)
                .ok_or_else(|| RecordError::NotFound(list.id.to_string())),
        })
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, id: &RecordId) -> Result<RecordId, RecordError> {
        let id = id.clone();
        self.with_records(move |doc| {
            if doc.remove(id.as_str()) {
                Ok(id)
            } else {
                Err(RecordError::NotFound(id.to_string()))
            }
        })
        .await
    }

    async fn fetch_current_user_identity(&self) -> Result<Identity, RecordError> {
        let user = current_user_name();
        let display_name = user.clone();

        let record = self
            .with_records(move |doc| {
                let existing = doc
                    .records
                    .get(RECORD_TYPE_USERS)
                    .and_then(|users| users.iter().find(|u| u.name == user))
                    .cloned();
                Ok(existing.unwrap_or_else(|| doc.insert(RECORD_TYPE_USERS, &user)))
            })
            .await?;

        Ok(Identity {
            record_id: RecordId::new(record.id),
            display_name: Some(display_name),
        })
    }

    async fn fetch_record(&self, id: &RecordId) -> Result<SavedList, RecordError> {
        let id = id.clone();
        self.with_records(move |doc| {
            doc.find(id.as_str())
                .map(|r| r.to_saved())
                .ok_or_else(|| RecordError::NotFound(id.to_string()))
        })
        .await
    }
}

/// Default data directory for the local store.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shopping-lists")
}

fn current_user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "local".to_string())
}

fn read_document(path: &Path) -> Result<RecordFile, RecordError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordFile::default()),
        Err(e) => return Err(io_error("read records", e)),
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| RecordError::Transport(format!("Corrupt records file: {}", e)))
}

fn write_document(dir: &Path, path: &Path, document: &RecordFile) -> Result<(), RecordError> {
    let json = serde_json::to_vec_pretty(document)
        .map_err(|e| RecordError::Transport(format!("Failed to encode records: {}", e)))?;

    let tmp = dir.join(format!("{}.tmp", RECORDS_FILE));
    let mut file = File::create(&tmp).map_err(|e| io_error("create temp file", e))?;
    io::Write::write_all(&mut file, &json).map_err(|e| io_error("write records", e))?;
    file.sync_all().map_err(|e| io_error("sync records", e))?;
    fs::rename(&tmp, path).map_err(|e| io_error("replace records", e))?;
    Ok(())
}

fn io_error(action: &str, e: io::Error) -> RecordError {
    RecordError::Transport(format!("Failed to {}: {}", action, e))
}
