//! Cloudflare D1 record store.
//!
//! Records live in a single `records` table keyed by id:
//! ```sql
//! CREATE TABLE records (
//!     id TEXT PRIMARY KEY,
//!     record_type TEXT NOT NULL,
//!     name TEXT NOT NULL,
//!     modified_at TEXT NOT NULL
//! )
//! ```

mod d1;

use async_trait::async_trait;
use serde::Deserialize;
use shopping_lists_core::{
    Identity, ListRecord, RecordError, RecordId, RecordService, SavedList, SORT_KEY_NAME,
};
use tracing::{debug, info, instrument};

pub use d1::{D1Client, TokenInfo, DEFAULT_API_BASE};

/// Record type under which user identities are kept.
pub const RECORD_TYPE_USERS: &str = "Users";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS records (\
     id TEXT PRIMARY KEY, \
     record_type TEXT NOT NULL, \
     name TEXT NOT NULL, \
     modified_at TEXT NOT NULL)";

#[derive(Debug, Deserialize)]
struct RecordRow {
    id: String,
    name: String,
}

impl From<RecordRow> for SavedList {
    fn from(row: RecordRow) -> Self {
        SavedList::new(RecordId::new(row.id), row.name)
    }
}

/// [`RecordService`] backed by a Cloudflare D1 database.
pub struct D1RecordService {
    client: D1Client,
}

impl D1RecordService {
    pub fn new(client: D1Client) -> Self {
        Self { client }
    }

    /// Create the records table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RecordError> {
        self.client.execute(CREATE_TABLE_SQL, Vec::new()).await?;
        info!("D1 schema ready");
        Ok(())
    }

    /// Run a statement expected to return at most one record row.
    async fn single_row(
        &self,
        sql: &str,
        params: Vec<String>,
        id: &str,
    ) -> Result<SavedList, RecordError> {
        let rows = self.client.execute(sql, params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(parse_row(row)?.into()),
            None => Err(RecordError::NotFound(id.to_string())),
        }
    }
}

fn parse_row(row: serde_json::Value) -> Result<RecordRow, RecordError> {
    serde_json::from_value(row)
        .map_err(|e| RecordError::Transport(format!("Malformed record row: {}", e)))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl RecordService for D1RecordService {
    #[instrument(skip(self), level = "debug")]
    async fn query_all(
        &self,
        record_type: &str,
        sort_key: &str,
    ) -> Result<Vec<SavedList>, RecordError> {
        // Column names cannot be bound as parameters.
        if sort_key != SORT_KEY_NAME {
            return Err(RecordError::Transport(format!(
                "Unsupported sort key: {}",
                sort_key
            )));
        }

        let rows = self
            .client
            .execute(
                "SELECT id, name FROM records WHERE record_type = ?1 \
                 ORDER BY name COLLATE NOCASE ASC",
                vec![record_type.to_string()],
            )
            .await?;

        let lists = rows
            .into_iter()
            .map(|row| parse_row(row).map(SavedList::from))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Fetched {} {} records", lists.len(), record_type);
        Ok(lists)
    }

    #[instrument(skip(self, record), level = "debug", fields(id = ?record.id()))]
    async fn save(
        &self,
        record_type: &str,
        record: &ListRecord,
    ) -> Result<SavedList, RecordError> {
        match record {
            ListRecord::Unsaved { name } => {
                let rows = self
                    .client
                    .execute(
                        "INSERT INTO records (id, record_type, name, modified_at) \
                         VALUES (?1, ?2, ?3, ?4) RETURNING id, name",
                        vec![
                            uuid::Uuid::new_v4().to_string(),
                            record_type.to_string(),
                            name.clone(),
                            now(),
                        ],
                    )
                    .await?;
                let row = rows.into_iter().next().ok_or(RecordError::EmptyResult)?;
                Ok(parse_row(row)?.into())
            }
            ListRecord::Saved(list) => {
                self.single_row(
                    "UPDATE records SET name = ?1, modified_at = ?2 \
                     WHERE id = ?3 RETURNING id, name",
                    vec![list.name.clone(), now(), list.id.to_string()],
                    list.id.as_str(),
                )
                .await
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, id: &RecordId) -> Result<RecordId, RecordError> {
        let rows = self
            .client
            .execute(
                "DELETE FROM records WHERE id = ?1 RETURNING id",
                vec![id.to_string()],
            )
            .await?;

        if rows.is_empty() {
            return Err(RecordError::NotFound(id.to_string()));
        }
        Ok(id.clone())
    }

    async fn fetch_current_user_identity(&self) -> Result<Identity, RecordError> {
        let token = self.client.verify_token().await?;

        // Keep a user record so the identity can be fetched like any other.
        self.client
            .execute(
                "INSERT INTO records (id, record_type, name, modified_at) \
                 VALUES (?1, ?2, ?3, ?4) ON CONFLICT(id) DO NOTHING",
                vec![
                    token.id.clone(),
                    RECORD_TYPE_USERS.to_string(),
                    format!("token {}", token.status),
                    now(),
                ],
            )
            .await?;

        Ok(Identity {
            record_id: RecordId::new(token.id),
            display_name: None,
        })
    }

    async fn fetch_record(&self, id: &RecordId) -> Result<SavedList, RecordError> {
        self.single_row(
            "SELECT id, name FROM records WHERE id = ?1",
            vec![id.to_string()],
            id.as_str(),
        )
        .await
    }
}
