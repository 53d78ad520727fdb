//! The UI queue.
//!
//! A [`MainQueue`] owns the [`ListStore`] and processes intents one at a
//! time, in arrival order. Remote calls are awaited on the queue's own task,
//! so every completion is applied there before the next intent is read.
//! Callers hold a cloneable [`ListsHandle`]; the queue stops once every
//! handle is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::editor::{EditorSession, SaveOutcome};
use crate::error::QueueError;
use crate::record::SavedList;
use crate::service::{log_user_identity, RecordService};
use crate::signal::SignalSink;
use crate::store::ListStore;

const INTENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Look up and log the current user on first activation.
    pub diagnostics: bool,
}

enum Intent {
    Load {
        reply: oneshot::Sender<bool>,
    },
    Delete {
        index: usize,
        reply: oneshot::Sender<Result<bool, QueueError>>,
    },
    BeginEdit {
        index: Option<usize>,
        reply: oneshot::Sender<Result<EditorSession, QueueError>>,
    },
    Report {
        outcome: SaveOutcome,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<SavedList>>,
    },
}

pub struct MainQueue {
    store: ListStore,
    intents: mpsc::Receiver<Intent>,
    options: QueueOptions,
    activated: bool,
}

impl MainQueue {
    /// Build a queue and its first handle. Nothing runs until
    /// [`run`](Self::run) is awaited on the task chosen as the UI task.
    pub fn new(
        service: Arc<dyn RecordService>,
        signals: SignalSink,
        options: QueueOptions,
    ) -> (Self, ListsHandle) {
        let (tx, rx) = mpsc::channel(INTENT_BUFFER);
        let queue = Self {
            store: ListStore::new(service, signals),
            intents: rx,
            options,
            activated: false,
        };
        (queue, ListsHandle { tx })
    }

    /// Run the queue on a dedicated tokio task.
    pub fn spawn(
        service: Arc<dyn RecordService>,
        signals: SignalSink,
        options: QueueOptions,
    ) -> (ListsHandle, JoinHandle<()>) {
        let (queue, handle) = Self::new(service, signals, options);
        (handle, tokio::spawn(queue.run()))
    }

    pub async fn run(mut self) {
        debug!("List queue started");
        while let Some(intent) = self.intents.recv().await {
            self.handle(intent).await;
        }
        debug!("List queue stopped");
    }

    async fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::Load { reply } => {
                if !self.activated {
                    self.activated = true;
                    if self.options.diagnostics {
                        let service = self.store.service();
                        tokio::spawn(async move { log_user_identity(service.as_ref()).await });
                    }
                }
                let loaded = self.store.load_all().await.is_ok();
                let _ = reply.send(loaded);
            }
            Intent::Delete { index, reply } => {
                let result = match self.store.get(index).cloned() {
                    Some(list) => Ok(self.store.delete_record(&list).await.is_ok()),
                    None => Err(QueueError::NoSuchRow(index)),
                };
                let _ = reply.send(result);
            }
            Intent::BeginEdit { index, reply } => {
                let existing = match index {
                    Some(index) => match self.store.get(index) {
                        Some(list) => Some(list.clone()),
                        None => {
                            let _ = reply.send(Err(QueueError::NoSuchRow(index)));
                            return;
                        }
                    },
                    None => None,
                };
                let session =
                    EditorSession::begin(self.store.service(), self.store.signals(), existing);
                let _ = reply.send(Ok(session));
            }
            Intent::Report { outcome, reply } => {
                info!("Editor reported {:?}", outcome);
                self.store.apply(outcome);
                let _ = reply.send(());
            }
            Intent::Snapshot { reply } => {
                let _ = reply.send(self.store.lists().to_vec());
            }
        }
    }
}

/// Cloneable handle for sending intents to a [`MainQueue`].
#[derive(Clone)]
pub struct ListsHandle {
    tx: mpsc::Sender<Intent>,
}

impl ListsHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Intent,
    ) -> Result<T, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| QueueError::Closed)?;
        rx.await.map_err(|_| QueueError::Closed)
    }

    /// Activate the list view: fetch every list. Returns whether the fetch
    /// succeeded.
    pub async fn load(&self) -> Result<bool, QueueError> {
        self.request(|reply| Intent::Load { reply }).await
    }

    /// Delete the list shown at row `index`. Returns whether it was removed.
    pub async fn delete(&self, index: usize) -> Result<bool, QueueError> {
        self.request(|reply| Intent::Delete { index, reply })
            .await?
    }

    /// Open an editor for the list at row `index`, or for a new list.
    pub async fn begin_edit(&self, index: Option<usize>) -> Result<EditorSession, QueueError> {
        self.request(|reply| Intent::BeginEdit { index, reply })
            .await?
    }

    /// Hand a finished editor's outcome back to the list owner.
    pub async fn report(&self, outcome: SaveOutcome) -> Result<(), QueueError> {
        self.request(|reply| Intent::Report { outcome, reply }).await
    }

    /// Copy of the lists in display order.
    pub async fn lists(&self) -> Result<Vec<SavedList>, QueueError> {
        self.request(|reply| Intent::Snapshot { reply }).await
    }
}
