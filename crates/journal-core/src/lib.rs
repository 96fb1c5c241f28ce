//! # journal-core
//!
//! why: define the data model shared by every journal implementation
//! relations: used by journal-storage for persistence, by consensus layers for replication
//! what: LogEntry struct, JournalVersion header identity, command codec seam

pub mod codec;
pub mod entry;
pub mod version;

pub use codec::{CodecError, CommandCodec, JsonCodec};
pub use entry::LogEntry;
pub use version::{JournalVersion, VersionError, JOURNAL_FORMAT_VERSION};
