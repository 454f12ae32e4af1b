//! Classification keys used to bucket candidates before any content read.

use std::fmt;
use std::path::Path;

use crate::scanner::FileDescriptor;

/// Bucket key derived from a descriptor's size and, optionally, its extension.
///
/// Files with different sizes never share a key. Files with equal sizes share
/// a key when extension sensitivity is off, or when their extensions are
/// byte-for-byte identical (case-sensitive, leading dot included).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassificationKey {
    size: u64,
    extension: String,
}

impl ClassificationKey {
    /// Build a key directly from its parts.
    #[must_use]
    pub fn new(size: u64, extension: impl Into<String>) -> Self {
        Self {
            size,
            extension: extension.into(),
        }
    }

    /// Compute the key for a descriptor.
    ///
    /// When `extension_sensitive` is false the extension is left empty so
    /// that files differing only by extension land in the same bucket.
    ///
    /// # Example
    ///
    /// ```
    /// use dupfind::duplicates::ClassificationKey;
    /// use dupfind::scanner::{EntryKind, FileDescriptor};
    /// use std::path::PathBuf;
    ///
    /// let file = FileDescriptor::new(PathBuf::from("/a/photo.JPG"), 42, EntryKind::File);
    /// assert_eq!(ClassificationKey::for_descriptor(&file, true).extension(), ".JPG");
    /// assert_eq!(ClassificationKey::for_descriptor(&file, false).extension(), "");
    /// ```
    #[must_use]
    pub fn for_descriptor(file: &FileDescriptor, extension_sensitive: bool) -> Self {
        let extension = if extension_sensitive {
            extension_of(file.path())
        } else {
            String::new()
        };
        Self::new(file.size(), extension)
    }

    /// Size component.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Extension component (empty when insensitive or absent).
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for ClassificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extension.is_empty() {
            write!(f, "{} bytes", self.size)
        } else {
            write!(f, "{} bytes, {}", self.size, self.extension)
        }
    }
}

/// Extension of the final path component, starting at its last dot.
///
/// Unlike [`Path::extension`], a leading-dot name such as `.bashrc` counts
/// as all extension, and the dot itself is kept.
fn extension_of(path: &Path) -> String {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.rfind('.')
                .map(|idx| name[idx..].to_string())
                .unwrap_or_default()
        })
        .unwrap_or_default()
}
