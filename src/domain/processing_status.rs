use std::fmt;
use std::str::FromStr;

/// Lifecycle of one clip, keyed by its file handle id.
///
/// Exactly one status per clip at any time; each transition overwrites the
/// previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStatus {
    Downloading,
    Transcribing,
    AwaitingConfirmation,
    ProcessingExpense,
    Completed,
    Failed,
    Rejected,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Downloading => "DOWNLOADING",
            ProcessingStatus::Transcribing => "TRANSCRIBING",
            ProcessingStatus::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            ProcessingStatus::ProcessingExpense => "PROCESSING_EXPENSE",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
            ProcessingStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingStatus::Completed | ProcessingStatus::Failed | ProcessingStatus::Rejected
        )
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DOWNLOADING" => Ok(ProcessingStatus::Downloading),
            "TRANSCRIBING" => Ok(ProcessingStatus::Transcribing),
            "AWAITING_CONFIRMATION" => Ok(ProcessingStatus::AwaitingConfirmation),
            "PROCESSING_EXPENSE" => Ok(ProcessingStatus::ProcessingExpense),
            "COMPLETED" => Ok(ProcessingStatus::Completed),
            "FAILED" => Ok(ProcessingStatus::Failed),
            "REJECTED" => Ok(ProcessingStatus::Rejected),
            _ => Err(format!("Invalid processing status: {}", s)),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
