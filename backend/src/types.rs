use serde::{Serialize, Deserialize};

/// The three phases the ingest workflow runs through, in order. Each
/// records its own resumability checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Load,
    Cleanup,
    Ingest,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Load => "load",
            WorkflowPhase::Cleanup => "cleanup",
            WorkflowPhase::Ingest => "ingest",
        }
    }
}

/// Options for an ingest run, mostly mapped from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Start from this page number, ignoring the resume checkpoint.
    pub from_page: Option<i32>,
    /// Process at most this many pages.
    pub limit: Option<usize>,
    /// Discard checkpoints and start over.
    pub fresh: bool,
}

/// Counters reported after an ingest run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub pages_processed: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
}

/// Snapshot of the archive for the status command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSummary {
    pub pages: i64,
    pub books: i64,
    pub chapters: i64,
    pub verses: i64,
    pub notes: i64,
    pub images: i64,
    pub page_errors: i64,
    /// (phase, last completed page) pairs.
    pub checkpoints: Vec<(String, i32)>,
}
