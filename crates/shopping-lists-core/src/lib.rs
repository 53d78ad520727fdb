//! Core types for shopping-lists.
//!
//! This crate holds everything that is independent of where records live:
//! - `RecordService`: the remote record store contract
//! - `ListStore`: the ordered in-memory view, reconciled after each remote call
//! - `EditorSession`: create-or-rename of a single list
//! - `MainQueue` / `ListsHandle`: the single task that owns and mutates the store
//! - `ViewSignal`: updates for whatever presents the lists

mod editor;
mod error;
mod queue;
mod record;
mod service;
mod signal;
mod store;

#[cfg(test)]
mod testing;

pub use editor::{EditorSession, EditorState, SaveOutcome};
pub use error::{EditorError, Operation, QueueError, RecordError};
pub use queue::{ListsHandle, MainQueue, QueueOptions};
pub use record::{
    compare_names, sort_by_name, ListRecord, RecordId, SavedList, RECORD_TYPE_LISTS,
    SORT_KEY_NAME,
};
pub use service::{log_user_identity, Identity, RecordService};
pub use signal::{SignalSink, ViewSignal};
pub use store::{ListStore, NO_RECORDS_FOUND, NO_RECORDS_LEFT};
