//! Filesystem walking for tab files

use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Default file name filters for tab files
pub const DEFAULT_FILTERS: &[&str] = &["*.gp3", "*.gp4", "*.gp5", "*.gtp", "*.gpx", "*.gp"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Walker for tab files in directories
#[derive(Debug, Clone)]
pub struct FileScanner {
    /// Whether to follow symbolic links
    follow_links: bool,

    /// Maximum depth to traverse (None for unlimited)
    max_depth: Option<usize>,

    /// File name patterns; empty matches everything
    filters: Vec<Pattern>,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self {
            follow_links: false,
            max_depth: None,
            filters: compile_filters(DEFAULT_FILTERS),
        }
    }
}

impl FileScanner {
    /// Create a new file scanner with the default tab filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to follow symbolic links
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Set maximum directory depth to traverse
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Replace the file name filters
    ///
    /// Invalid patterns are logged and dropped. An empty list matches every file.
    pub fn with_filters<S: AsRef<str>>(mut self, globs: &[S]) -> Self {
        self.filters = compile_filters(globs);
        self
    }

    /// Whether the file name of `path` matches at least one filter
    pub fn matches(&self, path: &Path) -> bool {
        if self.filters.is_empty() {
            return true;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        self.filters
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }

    /// Lazily enumerate matching regular files under `root`
    ///
    /// Directories, symlinks (unless following links) and unreadable
    /// entries are skipped. Order is whatever the filesystem returns.
    pub fn walk<'a>(&'a self, root: &Path) -> impl Iterator<Item = DirEntry> + 'a {
        let mut walker = WalkDir::new(root).follow_links(self.follow_links);

        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(move |entry| self.matches(entry.path()))
    }
}

fn compile_filters<S: AsRef<str>>(globs: &[S]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob.as_ref()) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("Invalid glob pattern '{}': {}", glob.as_ref(), e);
                None
            }
        })
        .collect()
}

/// Whether every pattern in `globs` compiles
pub fn validate_filters<S: AsRef<str>>(globs: &[S]) -> std::result::Result<(), String> {
    for glob in globs {
        Pattern::new(glob.as_ref())
            .map_err(|e| format!("invalid filter '{}': {}", glob.as_ref(), e))?;
    }
    Ok(())
}

/// Canonicalise roots and drop those nested inside another root
///
/// Missing or non-directory roots are logged and skipped.
pub fn non_overlapping_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for root in roots {
        let root = match fs::canonicalize(root) {
            Ok(root) if root.is_dir() => root,
            Ok(root) => {
                tracing::warn!("Skipping {}: not a directory", root.display());
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", root.display(), e);
                continue;
            }
        };

        if result.iter().any(|kept| root.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(&root));
        result.push(root);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_filters() {
        let scanner = FileScanner::new();
        assert!(scanner.matches(Path::new("song.gp5")));
        assert!(scanner.matches(Path::new("SONG.GP4")));
        assert!(scanner.matches(Path::new("/deep/dir/old.gtp")));
        assert!(!scanner.matches(Path::new("notes.txt")));
        assert!(!scanner.matches(Path::new("gp5")));
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let scanner = FileScanner::new().with_filters::<&str>(&[]);
        assert!(scanner.matches(Path::new("anything.bin")));
    }

    #[test]
    fn test_invalid_filters_are_dropped() {
        let scanner = FileScanner::new().with_filters(&["[", "*.gp3"]);
        assert!(scanner.matches(Path::new("a.gp3")));
        assert!(!scanner.matches(Path::new("a.gp5")));
        assert!(validate_filters(&["["]).is_err());
        assert!(validate_filters(&["*.gp3"]).is_ok());
    }

    fn write_tree(base: &Path) {
        fs::write(base.join("song1.gp5"), b"fake gp5").unwrap();
        fs::write(base.join("song2.gp3"), b"fake gp3").unwrap();
        fs::write(base.join("readme.txt"), b"not a tab").unwrap();

        let subdir = base.join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("song3.gp4"), b"fake gp4").unwrap();
    }

    #[test]
    fn test_walk_recurses_and_filters() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path());

        let scanner = FileScanner::new();
        let files: Vec<PathBuf> = scanner.walk(temp.path()).map(|e| e.into_path()).collect();

        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|p| p.ends_with("song1.gp5")));
        assert!(files.iter().any(|p| p.ends_with("song2.gp3")));
        assert!(files.iter().any(|p| p.ends_with("song3.gp4")));
        assert!(!files.iter().any(|p| p.ends_with("readme.txt")));
    }

    #[test]
    fn test_walk_with_max_depth() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path());

        // Depth 1 is the root directory's own entries
        let scanner = FileScanner::new().max_depth(1);
        let files: Vec<PathBuf> = scanner.walk(temp.path()).map(|e| e.into_path()).collect();

        assert_eq!(files.len(), 2);
        assert!(!files.iter().any(|p| p.ends_with("song3.gp4")));
    }

    #[test]
    fn test_walk_missing_root_is_empty() {
        let scanner = FileScanner::new();
        assert_eq!(scanner.walk(Path::new("/nonexistent/tabs")).count(), 0);
    }

    #[test]
    fn test_non_overlapping_roots() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        let nested = base.join("nested");
        let other = TempDir::new().unwrap();
        fs::create_dir(&nested).unwrap();

        let roots = non_overlapping_roots(&[
            nested.clone(),
            base.to_path_buf(),
            other.path().to_path_buf(),
            base.join("missing"),
        ]);

        assert_eq!(roots.len(), 2);
        assert!(roots.contains(&fs::canonicalize(base).unwrap()));
        assert!(roots.contains(&fs::canonicalize(other.path()).unwrap()));
    }
}
