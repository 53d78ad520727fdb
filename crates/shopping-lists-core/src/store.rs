//! The list synchronizer.
//!
//! `ListStore` owns the ordered in-memory view of every shopping list and
//! reconciles it with the outcome of each remote call. It is only ever
//! driven from one task (see [`crate::queue`]), so each operation runs to
//! completion before the next one starts.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::editor::SaveOutcome;
use crate::error::{Operation, RecordError};
use crate::record::{sort_by_name, SavedList, RECORD_TYPE_LISTS, SORT_KEY_NAME};
use crate::service::RecordService;
use crate::signal::{SignalSink, ViewSignal};

/// Label shown when a fetch succeeded but found nothing.
pub const NO_RECORDS_FOUND: &str = "No Records Found";

/// Label shown after the last list has been deleted.
pub const NO_RECORDS_LEFT: &str = "No records found";

pub struct ListStore {
    service: Arc<dyn RecordService>,
    signals: SignalSink,
    lists: Vec<SavedList>,
}

impl ListStore {
    pub fn new(service: Arc<dyn RecordService>, signals: SignalSink) -> Self {
        Self {
            service,
            signals,
            lists: Vec::new(),
        }
    }

    /// Lists in display order.
    pub fn lists(&self) -> &[SavedList] {
        &self.lists
    }

    pub fn get(&self, index: usize) -> Option<&SavedList> {
        self.lists.get(index)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub(crate) fn service(&self) -> Arc<dyn RecordService> {
        Arc::clone(&self.service)
    }

    pub(crate) fn signals(&self) -> SignalSink {
        self.signals.clone()
    }

    /// Fetch every list from the remote store and replace the local view.
    ///
    /// A failed fetch leaves the current lists untouched. The failure label
    /// is only shown when there are no lists left to display.
    pub async fn load_all(&mut self) -> Result<usize, RecordError> {
        self.signals.emit(ViewSignal::Loading);

        match self.service.query_all(RECORD_TYPE_LISTS, SORT_KEY_NAME).await {
            Ok(mut lists) => {
                sort_by_name(&mut lists);
                self.lists = lists;
                info!("Fetched {} lists", self.lists.len());

                self.show_rows(NO_RECORDS_FOUND);
                Ok(self.lists.len())
            }
            Err(RecordError::EmptyResult) => {
                warn!("Fetch returned no payload");
                self.show_rows(NO_RECORDS_FOUND);
                Err(RecordError::EmptyResult)
            }
            Err(e) => {
                warn!("Failed to {} lists: {}", Operation::Fetch, e);
                self.show_rows(Operation::Fetch.failure_message());
                Err(e)
            }
        }
    }

    /// Insert a list that the editor just created.
    pub fn record_added(&mut self, list: SavedList) {
        match self.lists.iter_mut().find(|l| l.id == list.id) {
            Some(existing) => {
                warn!("List {} added twice, overwriting", list.id);
                existing.name = list.name;
            }
            None => {
                debug!("List {} added", list.id);
                self.lists.push(list);
            }
        }

        sort_by_name(&mut self.lists);
        self.show_rows(NO_RECORDS_FOUND);
    }

    /// Take the new name of a list the editor just renamed.
    pub fn record_updated(&mut self, list: SavedList) {
        match self.lists.iter_mut().find(|l| l.id == list.id) {
            Some(existing) => {
                debug!("List {} renamed", list.id);
                existing.name = list.name;
            }
            None => warn!("Renamed list {} is not loaded, ignoring", list.id),
        }

        sort_by_name(&mut self.lists);
        self.show_rows(NO_RECORDS_FOUND);
    }

    /// Route an editor outcome to [`record_added`](Self::record_added) or
    /// [`record_updated`](Self::record_updated).
    pub fn apply(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Added(list) => self.record_added(list),
            SaveOutcome::Updated(list) => self.record_updated(list),
        }
    }

    /// Delete a list remotely, then drop its row.
    ///
    /// The row index is looked up again once the remote call returns.
    pub async fn delete_record(&mut self, list: &SavedList) -> Result<(), RecordError> {
        self.signals.emit(ViewSignal::ProgressShown);
        let result = self.service.delete(&list.id).await;
        self.signals.emit(ViewSignal::ProgressDismissed);

        if let Err(e) = result {
            warn!("Failed to {} list {}: {}", Operation::Delete, list.id, e);
            self.signals.alert(Operation::Delete.failure_message());
            return Err(e);
        }

        let Some(index) = self.lists.iter().position(|l| l.id == list.id) else {
            debug!("Deleted list {} was not loaded", list.id);
            return Ok(());
        };

        self.lists.remove(index);
        info!("Deleted list {}", list.id);

        if self.lists.is_empty() {
            self.signals.empty(NO_RECORDS_LEFT);
        } else {
            self.signals.emit(ViewSignal::RowDeleted { index });
        }
        Ok(())
    }

    /// Redraw every row, or show `message` when there is nothing to draw.
    fn show_rows(&self, message: &str) {
        if self.lists.is_empty() {
            self.signals.empty(message);
        } else {
            self.signals
                .emit(ViewSignal::RowsReloaded(self.lists.clone()));
            self.signals.emit(ViewSignal::Ready);
        }
    }
}
