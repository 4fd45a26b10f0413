use std::path::PathBuf;
use std::time::Duration;

/// Directories never descended into.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    ".idea",
    "__pycache__",
    "target",
    "build",
    "dist",
];

/// Directory names that hold installed third-party code.
pub const DEFAULT_DEPENDENCY_DIRS: &[&str] = &["venv", ".venv", "node_modules", "site-packages"];

/// File extensions skipped without being opened.
pub const DEFAULT_EXCLUDE_EXTENSIONS: &[&str] = &["svg", "png", "exe", "pyc", "qm"];

/// Tunables shared by the scanner, the engine and the controller.
///
/// Set through [`SearchBuilder`](crate::SearchBuilder); the defaults suit an
/// interactive editor search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Matcher worker threads per session.
    pub threads: usize,

    /// Upper bound on items in a finished result list.
    pub max_results: usize,

    /// Quiet period a submission must survive before it starts scanning.
    pub debounce: Duration,

    pub exclude_dirs: Vec<String>,

    /// Names of in-tree dependency-module directories.
    pub dependency_dirs: Vec<String>,

    /// Out-of-tree dependency-module roots, walked after the project root.
    pub dependency_roots: Vec<PathBuf>,

    /// Lowercase, without the leading dot.
    pub exclude_extensions: Vec<String>,

    /// Bytes read from the head of each file to detect binary content.
    pub binary_probe_len: usize,

    pub max_file_size: u64,

    pub max_depth: Option<usize>,

    /// Lines matched between two cancellation checks.
    pub line_batch: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads:            num_cpus(),
            max_results:        500,
            debounce:           Duration::from_millis(30),
            exclude_dirs:       to_owned(DEFAULT_EXCLUDE_DIRS),
            dependency_dirs:    to_owned(DEFAULT_DEPENDENCY_DIRS),
            dependency_roots:   Vec::new(),
            exclude_extensions: to_owned(DEFAULT_EXCLUDE_EXTENSIONS),
            binary_probe_len:   1024,
            max_file_size:      4 * 1024 * 1024,
            max_depth:          None,
            line_batch:         256,
        }
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Get the logical CPU count, with a safe fallback.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
