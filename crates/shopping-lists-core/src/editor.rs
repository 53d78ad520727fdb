use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{EditorError, Operation};
use crate::record::{ListRecord, SavedList, RECORD_TYPE_LISTS};
use crate::service::RecordService;
use crate::signal::{SignalSink, ViewSignal};

/// What a successful save did, reported back to the list owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Added(SavedList),
    Updated(SavedList),
}

impl SaveOutcome {
    pub fn record(&self) -> &SavedList {
        match self {
            SaveOutcome::Added(list) | SaveOutcome::Updated(list) => list,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Editing,
    Saving,
    Terminated,
}

/// One create-or-rename transaction for a single list.
pub struct EditorSession {
    service: Arc<dyn RecordService>,
    signals: SignalSink,
    staged: ListRecord,
    is_new_record: bool,
    state: EditorState,
}

impl EditorSession {
    /// Start editing `existing`, or a fresh list when `None`.
    pub fn begin(
        service: Arc<dyn RecordService>,
        signals: SignalSink,
        existing: Option<SavedList>,
    ) -> Self {
        let is_new_record = existing.is_none();
        let staged = match existing {
            Some(list) => ListRecord::Saved(list),
            None => ListRecord::unsaved(""),
        };

        Self {
            service,
            signals,
            staged,
            is_new_record,
            state: EditorState::Editing,
        }
    }

    pub fn is_new_record(&self) -> bool {
        self.is_new_record
    }

    pub fn staged(&self) -> &ListRecord {
        &self.staged
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Text the name field starts out with.
    pub fn initial_name(&self) -> &str {
        self.staged.name()
    }

    /// Whether the save trigger should be enabled for `name_input`.
    ///
    /// Only an empty string disables it; whitespace is accepted as-is.
    pub fn is_save_enabled(&self, name_input: &str) -> bool {
        self.state == EditorState::Editing && !name_input.is_empty()
    }

    /// Persist the staged list under `name_input`.
    ///
    /// On failure the session stays open with the staged record untouched,
    /// so the user can retry.
    pub async fn save(&mut self, name_input: &str) -> Result<SaveOutcome, EditorError> {
        match self.state {
            EditorState::Editing => {}
            EditorState::Saving => return Err(EditorError::SaveInProgress),
            EditorState::Terminated => return Err(EditorError::Terminated),
        }

        let candidate = self.staged.renamed(name_input);
        self.state = EditorState::Saving;
        self.signals.emit(ViewSignal::ProgressShown);
        let result = self.service.save(RECORD_TYPE_LISTS, &candidate).await;
        self.signals.emit(ViewSignal::ProgressDismissed);

        match result {
            Ok(saved) => {
                debug!(new = self.is_new_record, "Saved list {}", saved.id);
                self.staged = ListRecord::Saved(saved.clone());
                self.state = EditorState::Terminated;

                Ok(if self.is_new_record {
                    SaveOutcome::Added(saved)
                } else {
                    SaveOutcome::Updated(saved)
                })
            }
            Err(e) => {
                warn!("Failed to {} list: {}", Operation::Save, e);
                self.state = EditorState::Editing;
                let message = Operation::Save.failure_message();
                self.signals.alert(message);
                Err(EditorError::SaveFailed { message, source: e })
            }
        }
    }

    /// Leave without saving.
    pub fn cancel(&mut self) {
        self.state = EditorState::Terminated;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::record::RecordId;
    use crate::store::ListStore;
    use crate::testing::FakeService;

    fn session(service: &Arc<FakeService>, existing: Option<SavedList>) -> EditorSession {
        let (signals, _rx) = SignalSink::channel();
        EditorSession::begin(service.clone(), signals, existing)
    }

    #[test]
    fn test_save_enablement_is_empty_check_only() {
        let service = Arc::new(FakeService::default());
        let editor = session(&service, None);

        assert!(editor.is_new_record());
        assert_eq!(editor.initial_name(), "");
        assert!(!editor.is_save_enabled(""));
        assert!(editor.is_save_enabled("   "));
        assert!(editor.is_save_enabled("Groceries"));
    }

    #[test]
    fn test_update_mode_prefills_name() {
        let service = Arc::new(FakeService::default());
        let existing = SavedList::new(RecordId::new("7"), "Hardware");
        let editor = session(&service, Some(existing));

        assert!(!editor.is_new_record());
        assert_eq!(editor.initial_name(), "Hardware");
    }

    #[tokio::test]
    async fn test_create_round_trip_into_store() {
        let service = Arc::new(FakeService::default());
        let (signals, _rx) = SignalSink::channel();
        let mut store = ListStore::new(service.clone(), signals.clone());
        let mut editor = EditorSession::begin(service.clone(), signals, None);

        let outcome = editor.save("Groceries").await.unwrap();
        assert!(matches!(outcome, SaveOutcome::Added(_)));
        assert_eq!(editor.state(), EditorState::Terminated);
        store.apply(outcome);

        assert_eq!(store.len(), 1);
        let list = store.get(0).unwrap();
        assert_eq!(list.name, "Groceries");
        assert!(!list.id.as_str().is_empty());
    }

    #[tokio::test]
    async fn test_update_reports_updated() {
        let service = Arc::new(FakeService::with_records(&["Hardware"]));
        let existing = service.query_all("Lists", "name").await.unwrap().remove(0);
        let mut editor = session(&service, Some(existing.clone()));

        let outcome = editor.save("Hardware store").await.unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Updated(SavedList::new(existing.id, "Hardware store"))
        );
        assert_eq!(service.names(), ["Hardware store"]);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_session_open() {
        let service = Arc::new(FakeService::default());
        service.set_fail_save(true);
        let (signals, mut rx) = SignalSink::channel();
        let mut editor = EditorSession::begin(service.clone(), signals, None);

        let err = editor.save("Groceries").await.unwrap_err();
        assert!(matches!(err, EditorError::SaveFailed { .. }));
        assert_eq!(err.to_string(), "We are not able to save your list.");
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(editor.staged(), &ListRecord::unsaved(""));

        let mut alerts = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            if let ViewSignal::Alert { message } = signal {
                alerts.push(message);
            }
        }
        assert_eq!(alerts, ["We are not able to save your list."]);

        // Retry once the service recovers.
        service.set_fail_save(false);
        let outcome = editor.save("Groceries").await.unwrap();
        assert_eq!(outcome.record().name, "Groceries");
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_staged_name() {
        let service = Arc::new(FakeService::with_records(&["Books"]));
        let existing = service.query_all("Lists", "name").await.unwrap().remove(0);
        service.set_fail_save(true);
        let mut editor = session(&service, Some(existing.clone()));

        assert!(editor.save("Comics").await.is_err());
        assert_eq!(editor.staged(), &ListRecord::Saved(existing));
    }

    #[tokio::test]
    async fn test_save_guarded_while_outstanding() {
        let service = Arc::new(FakeService::default());
        service.set_hang_save(true);
        let mut editor = session(&service, None);

        let pending = tokio::time::timeout(Duration::from_millis(20), editor.save("Stuck")).await;
        assert!(pending.is_err());
        assert_eq!(editor.state(), EditorState::Saving);
        assert!(!editor.is_save_enabled("Stuck"));

        assert_eq!(editor.save("Again").await, Err(EditorError::SaveInProgress));
        assert_eq!(service.save_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_session_rejects_save() {
        let service = Arc::new(FakeService::default());
        let mut editor = session(&service, None);

        editor.cancel();
        assert_eq!(editor.save("Late").await, Err(EditorError::Terminated));
        assert_eq!(service.save_calls.load(Ordering::SeqCst), 0);
    }
}
