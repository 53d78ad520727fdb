//! Terminal presentation of the list view.

use std::io::{self, Write};

use shopping_lists_core::{SavedList, ViewSignal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewState {
    Loading,
    Rows,
    Message(String),
}

/// Mirror of what a list screen would display, rebuilt from view signals.
pub struct Screen {
    signals: UnboundedReceiver<ViewSignal>,
    rows: Vec<SavedList>,
    state: ViewState,
    alerts: Vec<String>,
}

impl Screen {
    pub fn new(signals: UnboundedReceiver<ViewSignal>) -> Self {
        Self {
            signals,
            rows: Vec::new(),
            state: ViewState::Loading,
            alerts: Vec::new(),
        }
    }

    /// Apply every signal received so far.
    pub fn drain(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            self.apply(signal);
        }
    }

    fn apply(&mut self, signal: ViewSignal) {
        match signal {
            ViewSignal::Loading => self.state = ViewState::Loading,
            ViewSignal::ProgressShown => debug!("Request started"),
            ViewSignal::ProgressDismissed => debug!("Request finished"),
            ViewSignal::RowsReloaded(rows) => self.rows = rows,
            ViewSignal::RowDeleted { index } => {
                if index < self.rows.len() {
                    self.rows.remove(index);
                }
            }
            ViewSignal::Ready => self.state = ViewState::Rows,
            ViewSignal::Empty { message } => {
                self.rows.clear();
                self.state = ViewState::Message(message);
            }
            ViewSignal::Alert { message } => self.alerts.push(message),
        }
    }

    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Write alerts to `err` and the current view to `out`.
    pub fn render(&self, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
        for alert in &self.alerts {
            writeln!(err, "Error: {}", alert)?;
        }

        match &self.state {
            ViewState::Loading => writeln!(out, "Loading...")?,
            ViewState::Message(message) => writeln!(out, "{}", message)?,
            ViewState::Rows => {
                let width = self.rows.len().to_string().len();
                for (i, list) in self.rows.iter().enumerate() {
                    writeln!(out, "{:>width$}  {}", i + 1, list.display_name(), width = width)?;
                }
            }
        }
        Ok(())
    }
}
