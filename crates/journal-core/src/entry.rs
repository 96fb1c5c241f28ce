//! # entry
//!
//! why: represent one proposed command in the replicated log
//! relations: appended via the Journal trait in journal-storage, shipped to peers over rpc
//! what: LogEntry struct with term, index and opaque command bytes

use serde::{Deserialize, Serialize};

/// A single entry in the replicated journal
///
/// The command is an opaque byte payload: the journal never inspects it, and
/// callers encode/decode it through a [`crate::CommandCodec`]. Once written,
/// an entry is never mutated in place; entries only leave the journal wholesale
/// from one end (tail truncation or head compaction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The consensus term under which this entry was proposed
    pub term: u64,
    /// The index of this entry in the log (1-indexed)
    pub index: u64,
    /// The opaque command payload to be applied to the state machine
    pub command: Vec<u8>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(term: u64, index: u64, command: Vec<u8>) -> Self {
        Self { term, index, command }
    }
}
