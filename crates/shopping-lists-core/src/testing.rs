//! Scripted in-memory record service for unit tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RecordError;
use crate::record::{sort_by_name, ListRecord, RecordId, SavedList};
use crate::service::{Identity, RecordService};

#[derive(Default)]
pub(crate) struct FakeService {
    records: Mutex<Vec<SavedList>>,
    next_id: AtomicU64,
    fail_query: Mutex<Option<RecordError>>,
    fail_save: AtomicBool,
    fail_delete: AtomicBool,
    hang_save: AtomicBool,
    pub(crate) save_calls: AtomicU64,
}

impl FakeService {
    pub(crate) fn with_records(names: &[&str]) -> Self {
        let service = Self::default();
        {
            let mut records = service.records.lock().unwrap();
            for name in names {
                let id = service.assign_id();
                records.push(SavedList::new(id, *name));
            }
        }
        service
    }

    pub(crate) fn fail_query_with(&self, error: RecordError) {
        *self.fail_query.lock().unwrap() = Some(error);
    }

    pub(crate) fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_hang_save(&self, hang: bool) {
        self.hang_save.store(hang, Ordering::SeqCst);
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let records = self.records.lock().unwrap();
        records.iter().map(|r| r.name.clone()).collect()
    }

    fn assign_id(&self) -> RecordId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        RecordId::new(format!("rec-{n}"))
    }
}

#[async_trait]
impl RecordService for FakeService {
    async fn query_all(
        &self,
        _record_type: &str,
        _sort_key: &str,
    ) -> Result<Vec<SavedList>, RecordError> {
        if let Some(e) = self.fail_query.lock().unwrap().clone() {
            return Err(e);
        }
        let mut records = self.records.lock().unwrap().clone();
        sort_by_name(&mut records);
        Ok(records)
    }

    async fn save(
        &self,
        _record_type: &str,
        record: &ListRecord,
    ) -> Result<SavedList, RecordError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_save.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(RecordError::Transport("connection reset".into()));
        }

        let mut records = self.records.lock().unwrap();
        match record {
            ListRecord::Unsaved { name } => {
                let saved = SavedList::new(self.assign_id(), name.clone());
                records.push(saved.clone());
                Ok(saved)
            }
            ListRecord::Saved(list) => {
                let existing = records
                    .iter_mut()
                    .find(|r| r.id == list.id)
                    .ok_or_else(|| RecordError::NotFound(list.id.to_string()))?;
                existing.name = list.name.clone();
                Ok(existing.clone())
            }
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<RecordId, RecordError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(RecordError::Transport("service unavailable".into()));
        }
        let mut records = self.records.lock().unwrap();
        let index = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;
        records.remove(index);
        Ok(id.clone())
    }

    async fn fetch_current_user_identity(&self) -> Result<Identity, RecordError> {
        Ok(Identity {
            record_id: RecordId::new("user"),
            display_name: Some("tester".into()),
        })
    }

    async fn fetch_record(&self, id: &RecordId) -> Result<SavedList, RecordError> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| RecordError::NotFound(id.to_string()))
    }
}
