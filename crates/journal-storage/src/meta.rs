//! # meta
//!
//! why: persist small auxiliary state without ever exposing a half-written file
//! relations: used by file.rs for the raft commit index, beside the journal file
//! what: JournalMeta record, MetaStore with temp-file-then-rename replacement

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::JournalError;

/// Auxiliary journal state persisted beside the record log
///
/// Serialized as a whole and replaced atomically; currently the only field is
/// the raft commit index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalMeta {
    /// Highest log index known to be committed, when it has ever been set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raft_commit_index: Option<u64>,
}

/// Persists a [`JournalMeta`] record with atomic whole-file replacement
#[derive(Debug)]
pub struct MetaStore {
    path: PathBuf,
}

impl MetaStore {
    /// Create a store writing to the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the metadata file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record, substituting the empty default on exactly
    /// three absorbed failure kinds: missing file, unreadable file, and
    /// unparseable content
    ///
    /// Metadata is best-effort and reconstructable from the replicated log,
    /// so none of these failures reaches the caller.
    pub fn load(&self) -> JournalMeta {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return JournalMeta::default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "metadata unreadable, starting empty");
                return JournalMeta::default();
            }
        };
        match serde_json::from_slice(&contents) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "metadata corrupt, starting empty");
                JournalMeta::default()
            }
        }
    }

    /// Persist the whole record
    ///
    /// The serialized bytes go to a temporary file beside the final path,
    /// are synced, then renamed over it, so the final path always holds
    /// either the previous complete record or the new one.
    pub fn store(&self, meta: &JournalMeta) -> Result<(), JournalError> {
        let json = serde_json::to_vec_pretty(meta)?;
        let temp_path = self.temp_path();
        // atomic write: write to temp file then rename
        let mut file = File::create(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
