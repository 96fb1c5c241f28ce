//! # memory
//!
//! why: offer a journal with no durability cost for tests and ephemeral nodes
//! relations: created by create_journal when no file path is supplied
//! what: MemoryJournal over a plain Vec

use journal_core::LogEntry;

use crate::error::JournalError;
use crate::Journal;

/// Non-persistent journal holding entries only in process memory
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Vec<LogEntry>,
}

impl MemoryJournal {
    /// Create an empty in-memory journal
    pub fn new() -> Self {
        Self::default()
    }
}

impl Journal for MemoryJournal {
    fn add(&mut self, command: Vec<u8>, index: u64, term: u64) -> Result<(), JournalError> {
        self.entries.push(LogEntry::new(term, index, command));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), JournalError> {
        self.entries.clear();
        Ok(())
    }

    fn delete_entries_from(&mut self, position: usize) -> Result<(), JournalError> {
        self.entries.truncate(position);
        Ok(())
    }

    fn delete_entries_to(&mut self, position: usize) -> Result<(), JournalError> {
        self.entries.drain(..position.min(self.entries.len()));
        Ok(())
    }

    fn entry(&self, position: usize) -> Result<&LogEntry, JournalError> {
        self.entries.get(position).ok_or(JournalError::OutOfRange {
            position,
            len: self.entries.len(),
        })
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn set_raft_commit_index(&mut self, _index: u64) {
        // deliberately not tracked: non-durable nodes re-derive commit state
        // from the consensus layer
    }

    fn raft_commit_index(&self) -> u64 {
        1
    }

    fn destroy(&mut self) -> Result<(), JournalError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: u64) -> MemoryJournal {
        let mut journal = MemoryJournal::new();
        for i in 0..n {
            journal.add(vec![i as u8], i + 1, 1).unwrap();
        }
        journal
    }

    #[test]
    fn add_and_read_back() {
        let journal = filled(3);

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.entry(0).unwrap().index, 1);
        assert_eq!(journal.entry(2).unwrap().command, vec![2]);
    }

    #[test]
    fn entry_past_end_is_out_of_range() {
        let journal = filled(2);

        let err = journal.entry(2).unwrap_err();

        assert!(matches!(
            err,
            JournalError::OutOfRange { position: 2, len: 2 }
        ));
    }

    #[test]
    fn delete_entries_from_truncates_the_tail() {
        let mut journal = filled(5);

        journal.delete_entries_from(2).unwrap();

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entry(1).unwrap().index, 2);
    }

    #[test]
    fn delete_entries_to_drops_the_head() {
        let mut journal = filled(5);

        journal.delete_entries_to(3).unwrap();

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entry(0).unwrap().index, 4);
    }

    #[test]
    fn delete_past_end_removes_nothing_or_everything() {
        let mut journal = filled(2);
        journal.delete_entries_from(10).unwrap();
        assert_eq!(journal.len(), 2);

        journal.delete_entries_to(10).unwrap();
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn commit_index_is_always_the_default() {
        let mut journal = filled(1);

        journal.set_raft_commit_index(99);

        assert_eq!(journal.raft_commit_index(), 1);
    }

    #[test]
    fn clear_empties_the_journal() {
        let mut journal = filled(4);

        journal.clear().unwrap();

        assert!(journal.is_empty());
    }
}
