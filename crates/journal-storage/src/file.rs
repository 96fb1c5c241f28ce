//! # file
//!
//! why: keep the replicated log durable across restarts in one self-describing file
//! relations: composes mapped.rs for the record stream and meta.rs for the
//! commit index, implements the Journal trait from lib.rs
//! what: FileJournal, header layout, replay recovery, tail/head truncation

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use journal_core::{
    version::{NAME_TAG_BYTES, VERSION_TAG_BYTES},
    JournalVersion, LogEntry,
};

use crate::error::JournalError;
use crate::mapped::{MappedFile, MappedFileOptions};
use crate::meta::{JournalMeta, MetaStore};
use crate::Journal;

// Header layout, little-endian:
//   app name (24b) + app version (8b) + format version (4b) + last record offset (4b)
// followed by delimited records up to the checkpointed last record offset:
//   [size: u32] [index: u64] [term: u64] [command] [size: u32]
const FORMAT_VERSION_OFFSET: usize = NAME_TAG_BYTES + VERSION_TAG_BYTES;
const LAST_RECORD_OFFSET_OFFSET: usize = FORMAT_VERSION_OFFSET + 4;
const FIRST_RECORD_OFFSET: u32 = (LAST_RECORD_OFFSET_OFFSET + 4) as u32;

/// Bytes of each record taken by the index and term fields
const RECORD_PRELUDE: u32 = 16;

/// How many backward steps a tail truncation may take between checkpoint
/// writes; the on-disk checkpoint is at most this stale mid-operation and is
/// forced exact before the call returns
const CHECKPOINT_EVERY: usize = 10;

/// Commit index reported before any value has been stored
const DEFAULT_COMMIT_INDEX: u64 = 1;

/// Disk-backed journal
///
/// The file is the authoritative copy; the in-memory entry vector is a mirror
/// rebuilt by replaying the record stream on open. After every call returns,
/// mirror and persisted stream are equal in count and content.
#[derive(Debug)]
pub struct FileJournal {
    store: MappedFile,
    entries: Vec<LogEntry>,
    meta_store: MetaStore,
    meta: JournalMeta,
    meta_saved: bool,
    current_offset: u32,
}

impl FileJournal {
    /// Open the journal at `path`, creating it when absent, and rebuild the
    /// in-memory mirror by replaying the record stream
    ///
    /// `version` supplies the header identity for a new file and the format
    /// version an existing file must carry.
    pub fn open(path: impl AsRef<Path>, version: JournalVersion) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let header = encode_header(&version);
        let store = MappedFile::open(path, MappedFileOptions::default(), Some(&header))?;

        let stored_format = read_u32_at(&store, FORMAT_VERSION_OFFSET)?;
        if stored_format != version.format_version {
            return Err(JournalError::InvalidHeader(format!(
                "format version {} on disk, this build reads {}",
                stored_format, version.format_version
            )));
        }
        let last_record_offset = read_u32_at(&store, LAST_RECORD_OFFSET_OFFSET)?;
        if last_record_offset as usize > store.capacity()? {
            return Err(JournalError::InvalidHeader(format!(
                "checkpointed offset {} beyond mapped capacity {}",
                last_record_offset,
                store.capacity()?
            )));
        }

        let meta_store = MetaStore::new(meta_path(path));
        let meta = meta_store.load();

        let mut entries = Vec::new();
        let mut current_offset = FIRST_RECORD_OFFSET;
        while current_offset < last_record_offset {
            let size = read_u32_at(&store, current_offset as usize)?;
            if size < RECORD_PRELUDE {
                return Err(JournalError::CorruptRecord {
                    offset: current_offset,
                    reason: "record shorter than its index/term prelude",
                });
            }
            if current_offset as u64 + 8 + size as u64 > last_record_offset as u64 {
                return Err(JournalError::CorruptRecord {
                    offset: current_offset,
                    reason: "record extends past the checkpointed end of the log",
                });
            }
            let payload = store.read(current_offset as usize + 4, size as usize)?;
            let index = u64_from_le(&payload[..8]);
            let term = u64_from_le(&payload[8..16]);
            entries.push(LogEntry::new(term, index, payload[16..].to_vec()));
            current_offset += size + 8;
        }
        debug!(path = %path.display(), entries = entries.len(), "journal replayed");

        Ok(Self {
            store,
            entries,
            meta_store,
            meta,
            meta_saved: true,
            current_offset,
        })
    }

    /// Force the record stream's mapped pages back to disk
    ///
    /// Callers that need durability stronger than OS page-cache semantics
    /// invoke this at controlled points, e.g. before acknowledging commitment
    /// to peers.
    pub fn flush(&self) -> Result<(), JournalError> {
        self.store.flush()
    }

    fn set_last_record_offset(&mut self, offset: u32) -> Result<(), JournalError> {
        self.store
            .write(LAST_RECORD_OFFSET_OFFSET, &offset.to_le_bytes())
    }
}

impl Journal for FileJournal {
    /// Append one entry and immediately checkpoint the new append cursor, so
    /// a crash right after this returns recovers exactly past this record
    fn add(&mut self, command: Vec<u8>, index: u64, term: u64) -> Result<(), JournalError> {
        let size = RECORD_PRELUDE + command.len() as u32;
        let mut frame = Vec::with_capacity(size as usize + 8);
        frame.extend_from_slice(&size.to_le_bytes());
        frame.extend_from_slice(&index.to_le_bytes());
        frame.extend_from_slice(&term.to_le_bytes());
        frame.extend_from_slice(&command);
        frame.extend_from_slice(&size.to_le_bytes());
        self.store.write(self.current_offset as usize, &frame)?;
        self.current_offset += frame.len() as u32;
        self.set_last_record_offset(self.current_offset)?;
        self.entries.push(LogEntry::new(term, index, command));
        Ok(())
    }

    /// Reset to the empty log; stale record bytes past the checkpoint become
    /// unreachable and are overwritten by future appends, not zeroed
    fn clear(&mut self) -> Result<(), JournalError> {
        self.entries.clear();
        self.set_last_record_offset(FIRST_RECORD_OFFSET)?;
        self.current_offset = FIRST_RECORD_OFFSET;
        Ok(())
    }

    /// Discard the conflicting tail by walking record boundaries backward
    /// from the append cursor, one trailing size field per removed entry
    fn delete_entries_from(&mut self, position: usize) -> Result<(), JournalError> {
        if position >= self.entries.len() {
            return Ok(());
        }
        let to_remove = self.entries.len() - position;
        self.entries.truncate(position);
        let mut offset = self.current_offset;
        for removed in 1..=to_remove {
            let trailing_size = read_u32_at(&self.store, offset as usize - 4)?;
            offset -= trailing_size + 8;
            if removed % CHECKPOINT_EVERY == 0 {
                self.set_last_record_offset(offset)?;
            }
        }
        self.current_offset = offset;
        self.set_last_record_offset(offset)
    }

    /// Compact the committed head by rewriting the surviving suffix
    ///
    /// The format has no cheap way to drop a prefix, so the survivors are
    /// re-appended after a clear. Infrequent by design: head compaction is
    /// triggered by snapshotting, not steady-state replication.
    fn delete_entries_to(&mut self, position: usize) -> Result<(), JournalError> {
        let keep_from = position.min(self.entries.len());
        let survivors = self.entries.split_off(keep_from);
        self.clear()?;
        for entry in survivors {
            self.add(entry.command, entry.index, entry.term)?;
        }
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

    fn set_raft_commit_index(&mut self, index: u64) {
        self.meta.raft_commit_index = Some(index);
        self.meta_saved = false;
    }

    fn raft_commit_index(&self) -> u64 {
        self.meta.raft_commit_index.unwrap_or(DEFAULT_COMMIT_INDEX)
    }

    /// Persist dirty metadata, amortizing the atomic-rename cost against a
    /// bounded one-tick loss window
    fn on_one_second_timer(&mut self) -> Result<(), JournalError> {
        if !self.meta_saved {
            // flag stays dirty on failure so the next tick retries
            self.meta_store.store(&self.meta)?;
            self.meta_saved = true;
        }
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), JournalError> {
        self.store.destroy()
    }
}

/// Metadata lives beside the journal at `<journal>.meta`
fn meta_path(journal_path: &Path) -> PathBuf {
    let mut name = OsString::from(journal_path.as_os_str());
    name.push(".meta");
    PathBuf::from(name)
}

fn encode_header(version: &JournalVersion) -> Vec<u8> {
    let mut header = vec![0u8; FIRST_RECORD_OFFSET as usize];
    // tags are zero-padded; anything past the field is dropped
    let name_len = version.app_name.len().min(NAME_TAG_BYTES - 1);
    header[..name_len].copy_from_slice(&version.app_name.as_bytes()[..name_len]);
    let tag_len = version.app_version.len().min(VERSION_TAG_BYTES - 1);
    header[NAME_TAG_BYTES..NAME_TAG_BYTES + tag_len]
        .copy_from_slice(&version.app_version.as_bytes()[..tag_len]);
    header[FORMAT_VERSION_OFFSET..FORMAT_VERSION_OFFSET + 4]
        .copy_from_slice(&version.format_version.to_le_bytes());
    header[LAST_RECORD_OFFSET_OFFSET..LAST_RECORD_OFFSET_OFFSET + 4]
        .copy_from_slice(&FIRST_RECORD_OFFSET.to_le_bytes());
    header
}

fn read_u32_at(store: &MappedFile, offset: usize) -> Result<u32, JournalError> {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(store.read(offset, 4)?);
    Ok(u32::from_le_bytes(buf))
}

fn u64_from_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
