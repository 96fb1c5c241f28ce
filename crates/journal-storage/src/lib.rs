//! # journal-storage
//!
//! why: provide the durable, ordered log a consensus engine replays after restart
//! relations: consumed by consensus layers through the Journal trait, built on
//! the journal-core data model
//! what: Journal trait, MemoryJournal, FileJournal, growable mmap store,
//! atomic metadata store

use std::path::Path;

use journal_core::{JournalVersion, LogEntry};

pub mod error;
pub mod file;
pub mod mapped;
pub mod memory;
pub mod meta;

pub use error::JournalError;
pub use file::FileJournal;
pub use mapped::{MappedFile, MappedFileOptions};
pub use memory::MemoryJournal;
pub use meta::{JournalMeta, MetaStore};

/// The contract every journal implementation satisfies
///
/// The journal assumes a single logical writer driving all mutating calls
/// sequentially, interleaved with a roughly once-per-second timer callback
/// from the same thread. Concurrent calls from multiple threads must be
/// prevented by the caller.
pub trait Journal {
    /// Append one entry with the given opaque command payload
    fn add(&mut self, command: Vec<u8>, index: u64, term: u64) -> Result<(), JournalError>;

    /// Remove all entries, resetting to the empty-log state
    fn clear(&mut self) -> Result<(), JournalError>;

    /// Remove entries at and after the given sequence position, discarding a
    /// conflicting tail; a position past the end removes nothing
    fn delete_entries_from(&mut self, position: usize) -> Result<(), JournalError>;

    /// Remove entries before the given sequence position, compacting a
    /// committed head after snapshotting
    fn delete_entries_to(&mut self, position: usize) -> Result<(), JournalError>;

    /// Random-access read by sequence position
    fn entry(&self, position: usize) -> Result<&LogEntry, JournalError>;

    /// Current entry count
    fn len(&self) -> usize;

    /// True when the journal holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the last-known-committed index
    fn set_raft_commit_index(&mut self, index: u64);

    /// The last-known-committed index, or `1` when never set
    fn raft_commit_index(&self) -> u64;

    /// Housekeeping hook the caller invokes roughly once per second;
    /// implementations that need no periodic work inherit this no-op
    fn on_one_second_timer(&mut self) -> Result<(), JournalError> {
        Ok(())
    }

    /// Release underlying OS resources; called exactly once at shutdown
    fn destroy(&mut self) -> Result<(), JournalError>;
}

/// Create a journal for the given file path, or a non-persistent in-memory
/// journal when no path is supplied
pub fn create_journal(journal_file: Option<&Path>) -> Result<Box<dyn Journal>, JournalError> {
    match journal_file {
        Some(path) => Ok(Box::new(FileJournal::open(path, JournalVersion::default())?)),
        None => Ok(Box::new(MemoryJournal::new())),
    }
}
