//! Recursive document loading from a source directory.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use cambium_core::error::{CambiumError, Result};
use cambium_core::types::Document;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Loads every readable text file under a directory, recursively.
///
/// Files that are not valid UTF-8 or are empty after trimming are skipped
/// with a debug log rather than failing the whole scan. A scan that yields
/// zero documents is a `DataLoad` error.
#[derive(Debug, Default)]
pub struct DocumentLoader {
    scans: AtomicUsize,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directory scans performed by this loader. Exposed so the
    /// memoization contract (one scan per cache key) can be observed.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Scan `dir` recursively and parse every file into a [`Document`].
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<Document>> {
        self.scans.fetch_add(1, Ordering::SeqCst);

        if !dir.is_dir() {
            return Err(CambiumError::DataLoad(format!(
                "source directory not found: {}",
                dir.display()
            )));
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let text = match std::fs::read_to_string(path) {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping non-text file");
                    continue;
                }
            };
            if text.trim().is_empty() {
                debug!(path = %path.display(), "Skipping empty file");
                continue;
            }

            let relative = path.strip_prefix(dir).unwrap_or(path).to_path_buf();
            documents.push(Document::new(relative, text));
        }

        if documents.is_empty() {
            return Err(CambiumError::DataLoad(format!(
                "no parsable documents found under {}",
                dir.display()
            )));
        }

        // Deterministic ordering regardless of filesystem iteration order.
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            count = documents.len(),
            dir = %dir.display(),
            "Documents loaded"
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_dir_missing_is_data_load_error() {
        let loader = DocumentLoader::new();
        let result = loader.load_dir(Path::new("/nonexistent/docs"));
        assert!(matches!(result, Err(CambiumError::DataLoad(_))));
    }

    #[test]
    fn test_load_dir_empty_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new();
        let result = loader.load_dir(dir.path());
        assert!(matches!(result, Err(CambiumError::DataLoad(_))));
    }

    #[test]
    fn test_load_dir_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "alpha doc");
        write(dir.path(), "b.md", "beta doc");

        let loader = DocumentLoader::new();
        let docs = loader.load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].path, Path::new("a.txt"));
        assert_eq!(docs[0].text, "alpha doc");
    }

    #[test]
    fn test_load_dir_recurses() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.txt", "top");
        write(dir.path(), "nested/deep/leaf.txt", "leaf");

        let loader = DocumentLoader::new();
        let docs = loader.load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|d| d.path == Path::new("nested/deep/leaf.txt")));
    }

    #[test]
    fn test_load_dir_skips_binary_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.txt", "content");
        write(dir.path(), "blank.txt", "   \n");
        std::fs::write(dir.path().join("binary.bin"), [0xFFu8, 0xFE, 0x00, 0x01]).unwrap();

        let loader = DocumentLoader::new();
        let docs = loader.load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, Path::new("good.txt"));
    }

    #[test]
    fn test_load_dir_only_unparsable_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("binary.bin"), [0xFFu8, 0xFE]).unwrap();

        let loader = DocumentLoader::new();
        let result = loader.load_dir(dir.path());
        assert!(matches!(result, Err(CambiumError::DataLoad(_))));
    }

    #[test]
    fn test_scan_counter_increments() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "a");

        let loader = DocumentLoader::new();
        assert_eq!(loader.scans(), 0);
        loader.load_dir(dir.path()).unwrap();
        loader.load_dir(dir.path()).unwrap();
        assert_eq!(loader.scans(), 2);
    }

    #[test]
    fn test_load_dir_deterministic_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "z.txt", "z");
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "m.txt", "m");

        let loader = DocumentLoader::new();
        let docs = loader.load_dir(dir.path()).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("a.txt").to_path_buf(),
                Path::new("m.txt").to_path_buf(),
                Path::new("z.txt").to_path_buf()
            ]
        );
    }
}
