//! # error
//!
//! why: give storage faults one taxonomy so callers can tell durable-loss
//! faults from recoverable ones
//! relations: returned by every fallible operation in this crate
//! what: JournalError enum

use std::io;

use thiserror::Error;

/// Errors raised by journal storage operations
///
/// Faults that compromise durability (growth failure, rename failure, corrupt
/// replay) always surface through this type; best-effort faults (missing or
/// corrupt metadata) are absorbed at the call site and never reach callers.
#[derive(Debug, Error)]
pub enum JournalError {
    /// An underlying file operation failed
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An entry was requested at a sequence position past the end of the log
    #[error("position {position} out of range for journal of length {len}")]
    OutOfRange { position: usize, len: usize },

    /// A byte range was requested past the mapped capacity
    #[error("read of {len} bytes at offset {offset} exceeds mapped capacity {capacity}")]
    ReadOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Replay found a record that cannot be trusted; the journal refuses to
    /// open rather than silently truncate
    #[error("corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u32, reason: &'static str },

    /// The file header does not describe a journal this build can read
    #[error("invalid journal header: {0}")]
    InvalidHeader(String),

    /// The store was already destroyed; no further operations are possible
    #[error("journal storage already destroyed")]
    Destroyed,

    /// Metadata could not be serialized for persistence
    #[error("metadata encoding failed: {0}")]
    MetaEncode(#[from] serde_json::Error),
}
