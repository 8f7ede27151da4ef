//! Files participating in a request's signature structure.

use std::hash::Hash;
use std::hash::Hasher;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// A file inside a request workspace.
///
/// Identity is the file's path: two items with the same path are equal
/// regardless of how they were discovered. The item also remembers the
/// container it was extracted from, so detached-file discovery can tell an
/// attachment apart from a sibling that merely shares its name.
///
/// # Examples
///
/// ```
/// use eidas_core::SignedItem;
/// use std::path::PathBuf;
///
/// let root = PathBuf::from("/work/files");
/// let item = SignedItem::new(root.join("sub/contract.pdf"), &root);
/// assert_eq!(item.file_name(), "contract.pdf");
/// assert_eq!(item.relative_path(), "sub/contract.pdf");
/// ```
#[derive(Debug, Clone)]
pub struct SignedItem {
    path: PathBuf,
    root: PathBuf,
    container: Option<PathBuf>,
}

impl SignedItem {
    /// Creates an item for a file that was not extracted from a container.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
            container: None,
        }
    }

    /// Creates an item for a file produced from `container`.
    #[must_use]
    pub fn extracted_from(path: impl Into<PathBuf>, container: &Self) -> Self {
        Self {
            path: path.into(),
            root: container.root.clone(),
            container: Some(container.path.clone()),
        }
    }

    /// Returns the file's path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the workspace root the item belongs to.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the container this item was extracted from, if any.
    #[inline]
    #[must_use]
    pub fn container(&self) -> Option<&Path> {
        self.container.as_deref()
    }

    /// Returns the directory holding the file.
    #[must_use]
    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.root)
    }

    /// Returns the file's name.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Returns the path relative to the workspace root, `/`-separated and
    /// without a leading separator.
    #[must_use]
    pub fn relative_path(&self) -> String {
        let relative = self.path.strip_prefix(&self.root).unwrap_or(&self.path);
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl PartialEq for SignedItem {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for SignedItem {}

impl Hash for SignedItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
