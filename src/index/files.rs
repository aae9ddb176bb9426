//! In-memory index of file paths for fast glob-based lookup.
//!
//! A map gives O(1) path lookups; a sorted path list gives deterministic
//! glob iteration in lexicographic order.

use std::collections::HashMap;
use std::sync::RwLock;

use globset::GlobBuilder;

use crate::error::{IndexError, Result};

use super::{IndexedFile, DEFAULT_MAX_RESULTS};

#[derive(Default)]
struct FileIndexInner {
    /// key: relative path (forward slashes)
    files: HashMap<String, IndexedFile>,
    /// kept sorted for consistent iteration
    sorted_paths: Vec<String>,
}

/// Keyword-addressable store of [`IndexedFile`] records with doublestar glob
/// queries. All methods are safe for concurrent use.
#[derive(Default)]
pub struct FileIndex {
    inner: RwLock<FileIndexInner>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file in the index.
    pub fn add_file(&self, file: IndexedFile) {
        let mut inner = self.write_inner();
        let relative_path = file.relative_path.clone();
        let existed = inner.files.insert(relative_path.clone(), file).is_some();
        if !existed {
            if let Err(pos) = inner.sorted_paths.binary_search(&relative_path) {
                inner.sorted_paths.insert(pos, relative_path);
            }
        }
    }

    /// Remove a file by its relative path. No-op when absent.
    pub fn remove_file(&self, relative_path: &str) {
        let mut inner = self.write_inner();
        if inner.files.remove(relative_path).is_none() {
            return;
        }
        if let Ok(pos) = inner
            .sorted_paths
            .binary_search_by(|p| p.as_str().cmp(relative_path))
        {
            inner.sorted_paths.remove(pos);
        }
    }

    /// Look up a file by its relative path.
    pub fn get_file(&self, relative_path: &str) -> Option<IndexedFile> {
        self.read_inner().files.get(relative_path).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.read_inner().files.len()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.read_inner().files.values().map(|f| f.size_bytes).sum()
    }

    /// Language label → number of indexed files.
    pub fn language_counts(&self) -> HashMap<String, usize> {
        let inner = self.read_inner();
        let mut counts = HashMap::new();
        for file in inner.files.values() {
            *counts.entry(file.language.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// All indexed files in lexicographic path order.
    /// Use with caution on large indexes.
    pub fn all_files(&self) -> Vec<IndexedFile> {
        let inner = self.read_inner();
        inner
            .sorted_paths
            .iter()
            .filter_map(|path| inner.files.get(path).cloned())
            .collect()
    }

    /// Files matching a doublestar glob pattern, in lexicographic order.
    /// `max_results <= 0` falls back to the default of 50.
    pub fn search_by_glob(&self, pattern: &str, max_results: i64) -> Result<Vec<IndexedFile>> {
        let max_results = if max_results <= 0 {
            DEFAULT_MAX_RESULTS as usize
        } else {
            max_results as usize
        };

        let pattern = pattern.replace('\\', "/");
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| IndexError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?
            .compile_matcher();

        let inner = self.read_inner();
        let mut results = Vec::new();
        for path in &inner.sorted_paths {
            if results.len() >= max_results {
                break;
            }
            if matcher.is_match(path.as_str()) {
                if let Some(file) = inner.files.get(path) {
                    results.push(file.clone());
                }
            }
        }
        Ok(results)
    }

    /// Remove all files from the index.
    pub fn clear(&self) {
        let mut inner = self.write_inner();
        inner.files.clear();
        inner.sorted_paths.clear();
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, FileIndexInner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, FileIndexInner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn file(relative_path: &str, language: &str, size: u64) -> IndexedFile {
        IndexedFile {
            path: PathBuf::from("/project").join(relative_path),
            relative_path: relative_path.to_string(),
            language: language.to_string(),
            size_bytes: size,
            mod_time: SystemTime::now(),
            line_count: 10,
        }
    }

    #[test]
    fn test_add_and_get() {
        let index = FileIndex::new();
        index.add_file(file("src/main.go", "Go", 120));

        let found = index.get_file("src/main.go").unwrap();
        assert_eq!(found.language, "Go");
        assert_eq!(found.size_bytes, 120);
        assert!(index.get_file("src/other.go").is_none());
    }

    #[test]
    fn test_add_replaces_existing() {
        let index = FileIndex::new();
        index.add_file(file("a.go", "Go", 10));
        index.add_file(file("a.go", "Go", 99));

        assert_eq!(index.file_count(), 1);
        assert_eq!(index.get_file("a.go").unwrap().size_bytes, 99);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let index = FileIndex::new();
        index.add_file(file("a.go", "Go", 10));
        index.remove_file("nope.go");
        assert_eq!(index.file_count(), 1);
    }

    #[test]
    fn test_sorted_paths_stay_sorted() {
        let index = FileIndex::new();
        for p in ["z.go", "a.go", "m/x.go", "b.go", "m/a.go"] {
            index.add_file(file(p, "Go", 1));
        }
        index.remove_file("b.go");

        let paths: Vec<String> = index
            .all_files()
            .into_iter()
            .map(|f| f.relative_path)
            .collect();
        assert_eq!(paths, vec!["a.go", "m/a.go", "m/x.go", "z.go"]);
    }

    #[test]
    fn test_totals_and_language_counts() {
        let index = FileIndex::new();
        index.add_file(file("a.go", "Go", 100));
        index.add_file(file("b.go", "Go", 50));
        index.add_file(file("c.ts", "TypeScript", 25));

        assert_eq!(index.file_count(), 3);
        assert_eq!(index.total_size_bytes(), 175);
        let counts = index.language_counts();
        assert_eq!(counts.get("Go"), Some(&2));
        assert_eq!(counts.get("TypeScript"), Some(&1));
    }

    #[test]
    fn test_search_by_glob_doublestar() {
        let index = FileIndex::new();
        index.add_file(file("main.go", "Go", 1));
        index.add_file(file("src/util.go", "Go", 1));
        index.add_file(file("src/deep/core.go", "Go", 1));
        index.add_file(file("app.ts", "TypeScript", 1));

        let results = index.search_by_glob("**/*.go", 0).unwrap();
        let paths: Vec<&str> = results.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["main.go", "src/deep/core.go", "src/util.go"]);
    }

    #[test]
    fn test_search_by_glob_single_star_stays_in_root() {
        let index = FileIndex::new();
        index.add_file(file("main.go", "Go", 1));
        index.add_file(file("src/util.go", "Go", 1));

        let results = index.search_by_glob("*.go", 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relative_path, "main.go");
    }

    #[test]
    fn test_search_by_glob_respects_max_results() {
        let index = FileIndex::new();
        for i in 0..10 {
            index.add_file(file(&format!("f{:02}.go", i), "Go", 1));
        }
        let results = index.search_by_glob("*.go", 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].relative_path, "f00.go");
    }

    #[test]
    fn test_search_by_glob_normalizes_backslashes() {
        let index = FileIndex::new();
        index.add_file(file("src/util.go", "Go", 1));
        let results = index.search_by_glob("src\\*.go", 0).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_search_by_glob_invalid_pattern() {
        let index = FileIndex::new();
        let err = index.search_by_glob("a[", 0).unwrap_err();
        assert!(matches!(err, IndexError::InvalidPattern { .. }));
    }

    #[test]
    fn test_clear() {
        let index = FileIndex::new();
        index.add_file(file("a.go", "Go", 1));
        index.clear();
        assert_eq!(index.file_count(), 0);
        assert!(index.all_files().is_empty());
    }
}
