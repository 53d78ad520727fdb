use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RecordError;
use crate::record::{ListRecord, RecordId, SavedList};

/// Identity of the user the remote store is acting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Id of the record describing this user
    pub record_id: RecordId,
    /// Human-readable account name, if the backend knows one
    pub display_name: Option<String>,
}

/// Remote record store holding shopping lists.
///
/// Implementations talk to whatever actually persists records (a cloud
/// database, a file on disk). Every call is a suspension point; callers
/// resume on their own task once the future completes.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Fetch every record of `record_type`, ordered ascending by `sort_key`.
    async fn query_all(
        &self,
        record_type: &str,
        sort_key: &str,
    ) -> Result<Vec<SavedList>, RecordError>;

    /// Upsert a record. Unsaved records get a fresh id; saved records are
    /// overwritten in place.
    ///
    /// # Returns
    /// The record as persisted, always carrying its id.
    async fn save(&self, record_type: &str, record: &ListRecord)
        -> Result<SavedList, RecordError>;

    /// Delete a record by id. Returns the id that was removed.
    async fn delete(&self, id: &RecordId) -> Result<RecordId, RecordError>;

    /// Identity of the current user.
    async fn fetch_current_user_identity(&self) -> Result<Identity, RecordError>;

    /// Fetch a single record by id.
    async fn fetch_record(&self, id: &RecordId) -> Result<SavedList, RecordError>;
}

/// Look up the current user and log their record.
///
/// Purely diagnostic: failures are logged and otherwise ignored.
pub async fn log_user_identity(service: &dyn RecordService) {
    let identity = match service.fetch_current_user_identity().await {
        Ok(identity) => identity,
        Err(e) => {
            debug!("Failed to fetch user identity: {}", e);
            return;
        }
    };

    match service.fetch_record(&identity.record_id).await {
        Ok(record) => debug!(
            user = identity.display_name.as_deref().unwrap_or("-"),
            "User record: {:?}",
            record
        ),
        Err(e) => debug!("Failed to fetch user record {}: {}", identity.record_id, e),
    }
}
