use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Trait for buffer access to enable testing with mocks.
///
/// The pipeline reads the whole target file once and writes it back once;
/// that pair of operations is the "editor transaction" here.
pub trait FileSystem: Send + Sync {
    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write string contents to file
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Mock filesystem implementation for testing (in-memory)
#[allow(dead_code)]
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
    writes: RwLock<Vec<PathBuf>>,
}

#[allow(dead_code)]
impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            writes: RwLock::new(Vec::new()),
        }
    }

    /// Seed a file without counting it as a pipeline write.
    pub fn seed(&self, path: &Path, contents: &str) {
        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.read().unwrap().get(path).cloned()
    }

    /// Paths written through the trait, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.read().unwrap().clone()
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Failed to read file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
        self.writes.write().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_write() {
        let fs = MockFileSystem::new();
        let path = Path::new("/tmp/notes.md");

        assert!(fs.read_to_string(path).is_err());
        assert!(!fs.exists(path));

        fs.seed(path, "hello");
        assert_eq!(fs.read_to_string(path).unwrap(), "hello");
        assert!(fs.writes().is_empty());

        fs.write(path, "rewritten").unwrap();
        assert_eq!(fs.contents(path).as_deref(), Some("rewritten"));
        assert_eq!(fs.writes().len(), 1);
    }
}
