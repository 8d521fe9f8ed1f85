//! Storage path helpers.

use std::path::{Path, PathBuf};

const SAFEKID_DIRNAME: &str = "safekid";
const DATABASE_FILENAME: &str = "messenger.sqlite";

/// Paths for messenger storage artifacts under `<root>/safekid`.
#[derive(Debug, Clone, uniffi::Object)]
pub struct StoragePaths {
    root: PathBuf,
    safekid_dir: PathBuf,
}

impl StoragePaths {
    /// Builds storage paths rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let safekid_dir = root.join(SAFEKID_DIRNAME);
        Self { root, safekid_dir }
    }

    /// Returns the storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the messenger storage directory.
    #[must_use]
    pub fn safekid_dir(&self) -> &Path {
        &self.safekid_dir
    }

    /// Returns the path to the messenger database.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.safekid_dir.join(DATABASE_FILENAME)
    }
}

#[uniffi::export]
impl StoragePaths {
    /// Builds storage paths rooted at `root`.
    #[uniffi::constructor]
    #[must_use]
    pub fn from_root(root: String) -> Self {
        Self::new(PathBuf::from(root))
    }

    /// Returns the storage root directory as a string.
    #[must_use]
    pub fn root_path_string(&self) -> String {
        self.root.to_string_lossy().to_string()
    }

    /// Returns the messenger storage directory as a string.
    #[must_use]
    pub fn safekid_dir_path_string(&self) -> String {
        self.safekid_dir.to_string_lossy().to_string()
    }

    /// Returns the path to the messenger database as a string.
    #[must_use]
    pub fn database_path_string(&self) -> String {
        self.database_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::StoragePaths;
    use std::path::PathBuf;

    #[test]
    fn test_database_path() {
        let root = PathBuf::from("/tmp/safekid-paths");
        let paths = StoragePaths::new(&root);
        let safekid = root.join("safekid");

        assert_eq!(paths.root(), root);
        assert_eq!(paths.safekid_dir(), safekid);
        assert_eq!(paths.database_path(), safekid.join("messenger.sqlite"));
    }

    #[test]
    fn test_path_strings() {
        let paths = StoragePaths::from_root("/tmp/safekid-paths".to_string());

        assert_eq!(paths.root_path_string(), "/tmp/safekid-paths");
        assert_eq!(
            paths.safekid_dir_path_string(),
            paths.safekid_dir().to_string_lossy()
        );
        assert_eq!(
            paths.database_path_string(),
            paths.database_path().to_string_lossy()
        );
    }
}
