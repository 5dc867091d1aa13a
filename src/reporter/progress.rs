//! Running count of processed containers for the status stream.

use crate::runtime::StatusMessage;

/// Counter owned by the report collector.
#[derive(Debug, Default)]
pub struct ScanProgress {
    analyzed: usize,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more container and return the message to display.
    pub fn inc(&mut self) -> StatusMessage {
        self.analyzed += 1;
        StatusMessage::Transient(format!("Analyzed {} containers", self.analyzed))
    }

    pub fn analyzed(&self) -> usize {
        self.analyzed
    }

    /// Terminates the transient line, if one was drawn.
    pub fn finish(&self) -> Option<StatusMessage> {
        (self.analyzed > 0).then(|| StatusMessage::Raw("\n".to_string()))
    }
}
