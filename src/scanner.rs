use log::debug;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Maximum depth of bounded directory searches below a search root
pub const SEARCH_DEPTH: usize = 3;

/// Depth of the source existence probe below the working tree root
const PROBE_DEPTH: usize = SEARCH_DEPTH + 1;

/// File scanner for Rust source trees.
///
/// Skips `target` and hidden directories, and never follows symbolic links.
///
/// # Example
///
/// ```no_run
/// use handler_schema::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"));
/// if scanner.has_source_files() {
///     for dir in scanner.find_dirs_named("models") {
///         println!("candidate module directory: {}", dir.display());
///     }
/// }
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let file_name = entry.file_name().to_string_lossy();
    file_name.starts_with('.') || file_name == "target"
}

fn is_rust_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs")
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    fn walker(&self, max_depth: Option<usize>) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
        let mut walker = WalkDir::new(&self.root_path).follow_links(false);
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }
        walker.into_iter().filter_entry(|e| !is_skipped(e))
    }

    /// Cheap probe: stops at the first `.rs` file found near the root
    pub fn has_source_files(&self) -> bool {
        let found = self
            .walker(Some(PROBE_DEPTH))
            .filter_map(|entry| entry.ok())
            .any(|entry| is_rust_file(entry.path()));
        debug!(
            "Source probe under {}: {}",
            self.root_path.display(),
            if found { "found" } else { "none" }
        );
        found
    }

    /// Directories named `name` at most [`SEARCH_DEPTH`] levels below the root
    pub fn find_dirs_named(&self, name: &str) -> Vec<PathBuf> {
        self.walker(Some(SEARCH_DEPTH))
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == name
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Files named `file_name` at most [`SEARCH_DEPTH`] levels below the root
    pub fn find_files_named(&self, file_name: &str) -> Vec<PathBuf> {
        self.walker(Some(SEARCH_DEPTH))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
            .map(|entry| entry.into_path())
            .collect()
    }
}
