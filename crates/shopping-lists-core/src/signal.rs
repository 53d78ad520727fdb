use tokio::sync::mpsc;
use tracing::trace;

use crate::record::SavedList;

/// Update sent to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSignal {
    /// A fetch is running; rows and message are hidden.
    Loading,
    /// A blocking remote call started.
    ProgressShown,
    /// The blocking remote call finished.
    ProgressDismissed,
    /// Redraw every row from this snapshot.
    RowsReloaded(Vec<SavedList>),
    /// Remove the row at `index`.
    RowDeleted { index: usize },
    /// Rows are visible, no message.
    Ready,
    /// No rows to show; display `message` instead.
    Empty { message: String },
    /// Modal error.
    Alert { message: String },
}

/// Sending half of the signal channel.
///
/// Cloned into every component that reports to the presentation layer.
/// A dropped receiver is not an error: signals are simply discarded.
#[derive(Debug, Clone)]
pub struct SignalSink {
    tx: mpsc::UnboundedSender<ViewSignal>,
}

impl SignalSink {
    /// Create a sink and the receiver the presentation layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ViewSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, signal: ViewSignal) {
        if let Err(e) = self.tx.send(signal) {
            trace!("Presentation gone, dropping {:?}", e.0);
        }
    }

    pub(crate) fn empty(&self, message: &str) {
        self.emit(ViewSignal::Empty {
            message: message.to_string(),
        });
    }

    pub(crate) fn alert(&self, message: &str) {
        self.emit(ViewSignal::Alert {
            message: message.to_string(),
        });
    }
}
