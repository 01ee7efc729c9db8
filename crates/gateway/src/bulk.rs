//! Per-item outcome tally for multi-file operations

use serde::Serialize;
use tidybox_guard::{AccessError, ErrorKind};

use crate::gateway::DirEntry;

/// An item that went through, with what it looked like beforehand
#[derive(Debug, Clone, Serialize)]
pub struct BulkSuccess<T> {
    pub source: String,
    pub entry: DirEntry,
    pub result: T,
}

/// An item that failed and why
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub source: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Results of a bulk call. Items never roll each other back.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport<T> {
    pub succeeded: Vec<BulkSuccess<T>>,
    pub failed: Vec<BulkFailure>,
}

impl<T> BulkReport<T> {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, source: &str, outcome: Result<(DirEntry, T), AccessError>) {
        match outcome {
            Ok((entry, result)) => self.succeeded.push(BulkSuccess {
                source: source.to_string(),
                entry,
                result,
            }),
            Err(e) => self.failed.push(BulkFailure {
                source: source.to_string(),
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<T> Default for BulkReport<T> {
    fn default() -> Self {
        Self::new()
    }
}
