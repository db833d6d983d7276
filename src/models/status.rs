use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Failed,
    Skipped,
}

impl Display for DispatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DispatchStatus::Sent => write!(f, "sent"),
            DispatchStatus::Failed => write!(f, "failed"),
            DispatchStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Counts reported by the completion log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: DispatchStatus) {
        match status {
            DispatchStatus::Sent => self.sent += 1,
            DispatchStatus::Failed => self.failed += 1,
            DispatchStatus::Skipped => self.skipped += 1,
        }
    }
}
