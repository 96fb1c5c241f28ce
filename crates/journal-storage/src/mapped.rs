//! # mapped
//!
//! why: give the record log a byte-addressable region that grows transparently
//! relations: used by file.rs as the backing store for the binary record stream
//! what: MappedFile over memmap2, MappedFileOptions, two-path capacity growth

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::trace;

use crate::error::JournalError;

/// Tunables for opening a [`MappedFile`]
#[derive(Debug, Clone)]
pub struct MappedFileOptions {
    /// Capacity the backing file is extended to before first mapping
    pub initial_capacity: usize,
    /// Multiplier applied to the current capacity when a write needs more room
    pub growth_factor: f64,
}

impl Default for MappedFileOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            growth_factor: 2.0,
        }
    }
}

/// A single file exposed as a growable memory-mapped byte buffer
///
/// Mapped capacity is always at least the highest byte offset ever written,
/// and may exceed logical content length (pre-grown slack). Callers track
/// logical length themselves; the file journal does so through its header's
/// checkpointed offset.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    file: Option<File>,
    map: Option<MmapMut>,
    growth_factor: f64,
}

impl MappedFile {
    /// Open the file at `path`, creating it with `default_content` when absent
    ///
    /// A new or undersized file is extended to `options.initial_capacity`
    /// before mapping (a zero-length file cannot be mapped at all).
    pub fn open(
        path: impl AsRef<Path>,
        options: MappedFileOptions,
        default_content: Option<&[u8]>,
    ) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let fresh = !path.exists();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        if fresh {
            if let Some(content) = default_content {
                file.write_all(content)?;
            }
        }
        let len = file.metadata()?.len() as usize;
        if len < options.initial_capacity {
            file.set_len(options.initial_capacity as u64)?;
        }
        // SAFETY: the backing file is exclusively owned by this store for the
        // lifetime of the mapping (single-writer model); no other process or
        // handle mutates it while mapped.
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            path: path.to_owned(),
            file: Some(file),
            map: Some(map),
            growth_factor: options.growth_factor,
        })
    }

    /// Current mapped capacity in bytes
    pub fn capacity(&self) -> Result<usize, JournalError> {
        Ok(self.map()?.len())
    }

    /// Copy `bytes` into the region starting at `offset`, growing capacity
    /// first when the write would run past the current mapping
    ///
    /// Growth happens before any payload byte is applied, so a failed growth
    /// (disk full, permission denied) leaves no partial write visible.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), JournalError> {
        let end = offset + bytes.len();
        if end > self.capacity()? {
            self.grow(end)?;
        }
        let map = self.map.as_mut().ok_or(JournalError::Destroyed)?;
        map[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8], JournalError> {
        let map = self.map()?;
        if offset + len > map.len() {
            return Err(JournalError::ReadOutOfBounds {
                offset,
                len,
                capacity: map.len(),
            });
        }
        Ok(&map[offset..offset + len])
    }

    /// Force mapped pages back to the backing file
    ///
    /// Does not truncate pre-grown slack past the logical content length.
    pub fn flush(&self) -> Result<(), JournalError> {
        self.map()?.flush()?;
        Ok(())
    }

    /// Flush, then release the mapping and the file handle
    ///
    /// Any later operation observes [`JournalError::Destroyed`].
    pub fn destroy(&mut self) -> Result<(), JournalError> {
        if let Some(map) = self.map.take() {
            map.flush()?;
        }
        self.file = None;
        Ok(())
    }

    fn map(&self) -> Result<&MmapMut, JournalError> {
        self.map.as_ref().ok_or(JournalError::Destroyed)
    }

    /// Extend capacity until it covers `needed` bytes
    ///
    /// The backing file is lengthened first, then the mapping is resized in
    /// place where the platform supports it; otherwise the old mapping is
    /// dropped and the extended file mapped afresh.
    fn grow(&mut self, needed: usize) -> Result<(), JournalError> {
        let current = self.capacity()?;
        let mut target = current.max(1);
        while target < needed {
            target = ((target as f64 * self.growth_factor) as usize).max(target + 1);
        }
        let file = self.file.as_ref().ok_or(JournalError::Destroyed)?;
        file.set_len(target as u64)?;
        trace!(path = %self.path.display(), from = current, to = target, "growing mapped capacity");
        #[cfg(target_os = "linux")]
        {
            use memmap2::RemapOptions;
            let map = self.map.as_mut().ok_or(JournalError::Destroyed)?;
            // SAFETY: the file was just extended to `target`, so the resized
            // mapping stays within the backing file.
            if unsafe { map.remap(target, RemapOptions::new().may_move(true)) }.is_ok() {
                return Ok(());
            }
        }
        // Fallback for platforms that cannot resize a live mapping: unmap,
        // then map the already-extended file again.
        self.map = None;
        let file = self.file.as_ref().ok_or(JournalError::Destroyed)?;
        // SAFETY: same exclusive-ownership argument as in `open`.
        self.map = Some(unsafe { MmapMut::map_mut(file)? });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_options() -> MappedFileOptions {
        MappedFileOptions {
            initial_capacity: 64,
            growth_factor: 2.0,
        }
    }

    #[test]
    fn new_file_starts_with_default_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");

        let store = MappedFile::open(&path, small_options(), Some(b"HEADER")).unwrap();

        assert_eq!(store.read(0, 6).unwrap(), b"HEADER");
        assert_eq!(store.capacity().unwrap(), 64);
    }

    #[test]
    fn existing_file_keeps_its_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");

        {
            let mut store = MappedFile::open(&path, small_options(), Some(b"OLD")).unwrap();
            store.write(3, b"DATA").unwrap();
            store.flush().unwrap();
        }
        let store = MappedFile::open(&path, small_options(), Some(b"NEW")).unwrap();

        assert_eq!(store.read(0, 7).unwrap(), b"OLDDATA");
    }

    #[test]
    fn write_past_capacity_grows_the_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let mut store = MappedFile::open(&path, small_options(), None).unwrap();

        let payload = vec![0xAB; 10_000];
        store.write(50, &payload).unwrap();

        assert!(store.capacity().unwrap() >= 10_050);
        assert_eq!(store.read(50, 10_000).unwrap(), payload.as_slice());
    }

    #[test]
    fn grown_content_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");

        {
            let mut store = MappedFile::open(&path, small_options(), None).unwrap();
            store.write(4000, b"far out").unwrap();
            store.flush().unwrap();
        }
        let store = MappedFile::open(&path, small_options(), None).unwrap();

        assert_eq!(store.read(4000, 7).unwrap(), b"far out");
    }

    #[test]
    fn read_past_capacity_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let store = MappedFile::open(&path, small_options(), None).unwrap();

        let err = store.read(60, 10).unwrap_err();

        assert!(matches!(err, JournalError::ReadOutOfBounds { .. }));
    }

    #[test]
    fn operations_after_destroy_fail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let mut store = MappedFile::open(&path, small_options(), None).unwrap();

        store.destroy().unwrap();

        assert!(matches!(store.read(0, 1), Err(JournalError::Destroyed)));
        assert!(matches!(store.write(0, b"x"), Err(JournalError::Destroyed)));
        // a second destroy must not corrupt anything
        store.destroy().unwrap();
    }
}
