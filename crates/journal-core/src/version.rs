//! # version
//!
//! why: give the on-disk journal an identity independent of the surrounding build
//! relations: written into the file header by journal-storage's FileJournal
//! what: JournalVersion struct, header tag sizes, current format revision

use thiserror::Error;

/// Current on-disk format revision
pub const JOURNAL_FORMAT_VERSION: u32 = 1;

/// Size of the zero-padded application name field in the file header
pub const NAME_TAG_BYTES: usize = 24;

/// Size of the zero-padded application version field in the file header
pub const VERSION_TAG_BYTES: usize = 8;

/// Errors raised when constructing a [`JournalVersion`]
#[derive(Debug, Error)]
pub enum VersionError {
    /// The application name does not fit its zero-padded header field
    #[error("app name `{0}` does not fit the {NAME_TAG_BYTES}-byte header field")]
    NameTooLong(String),
    /// The application version does not fit its zero-padded header field
    #[error("app version `{0}` does not fit the {VERSION_TAG_BYTES}-byte header field")]
    VersionTooLong(String),
}

/// Identity stamped into the journal file header
///
/// Passed into file journal construction so the storage format's identity is
/// decoupled from whatever application embeds the journal. The name and
/// version tags are informational; the format version gates whether an
/// existing file can be opened at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalVersion {
    /// Zero-padded identifier tag, at most 23 bytes
    pub app_name: String,
    /// Zero-padded version string, at most 7 bytes
    pub app_version: String,
    /// On-disk format revision
    pub format_version: u32,
}

impl JournalVersion {
    /// Create a version record, validating that both tags fit their
    /// zero-padded header fields (each needs at least one trailing NUL)
    pub fn new(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        format_version: u32,
    ) -> Result<Self, VersionError> {
        let app_name = app_name.into();
        let app_version = app_version.into();
        if app_name.len() >= NAME_TAG_BYTES {
            return Err(VersionError::NameTooLong(app_name));
        }
        if app_version.len() >= VERSION_TAG_BYTES {
            return Err(VersionError::VersionTooLong(app_version));
        }
        Ok(Self {
            app_name,
            app_version,
            format_version,
        })
    }
}

impl Default for JournalVersion {
    fn default() -> Self {
        Self {
            app_name: "RaftJournal".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            format_version: JOURNAL_FORMAT_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_version_fits_header_fields() {
        let version = JournalVersion::default();

        assert!(version.app_name.len() < NAME_TAG_BYTES);
        assert!(version.app_version.len() < VERSION_TAG_BYTES);
        assert_eq!(version.format_version, JOURNAL_FORMAT_VERSION);
    }

    #[test]
    fn accepts_tags_that_fit() {
        let version = JournalVersion::new("my-app", "2.4", 1).unwrap();

        assert_eq!(version.app_name, "my-app");
        assert_eq!(version.app_version, "2.4");
    }

    #[test]
    fn rejects_name_that_needs_the_whole_field() {
        let err = JournalVersion::new("a".repeat(NAME_TAG_BYTES), "1.0", 1).unwrap_err();

        assert!(matches!(err, VersionError::NameTooLong(_)));
    }

    #[test]
    fn rejects_oversized_version_tag() {
        let err = JournalVersion::new("app", "10.20.30", 1).unwrap_err();

        assert!(matches!(err, VersionError::VersionTooLong(_)));
    }
}
