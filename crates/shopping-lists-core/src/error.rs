use std::fmt;

/// Errors reported by a [`RecordService`](crate::RecordService).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operation returned no usable payload")]
    EmptyResult,

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Kind of remote operation, used to pick the user-facing failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Save,
    Delete,
}

impl Operation {
    /// Generic message shown to the user when this operation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Fetch => "Error Fetching Records",
            Operation::Save => "We are not able to save your list.",
            Operation::Delete => "We are unable to delete this list.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Fetch => "fetch",
            Operation::Save => "save",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors from an editor session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Editor session has terminated")]
    Terminated,

    #[error("{message}")]
    SaveFailed {
        message: &'static str,
        #[source]
        source: RecordError,
    },
}

/// Errors from talking to the list queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("List queue has shut down")]
    Closed,

    #[error("No list at row {0}")]
    NoSuchRow(usize),
}
