//! # linesift
//!
//! Background fuzzy line search over a directory tree, built to sit behind an
//! editor's search box.
//!
//! Every keystroke becomes a new query. Each query supersedes the previous
//! one: the old session is cancelled cooperatively and never reports, and
//! only the newest query that runs to completion produces a [`Finished`]
//! event. That event carries a ranked, capped, deterministically ordered list
//! of [`SearchItem`]s.
//!
//! The pipeline per query:
//!
//! 1. [`DirectoryScanner`] walks the root depth-first in lexical order,
//!    pruning excluded and dependency-module directories and dropping binary,
//!    oversized and unreadable files.
//! 2. Worker threads run the [`FuzzyMatcher`] over every line of every
//!    candidate.
//! 3. The aggregator keeps the best matches and sorts them by descending
//!    score, then path, line and column.
//!
//! # Quick Start
//!
//! ```rust
//! use std::fs;
//!
//! let dir = tempfile::tempdir().unwrap();
//! fs::write(dir.path().join("a.txt"), "hello world").unwrap();
//! fs::create_dir(dir.path().join("b")).unwrap();
//! fs::write(dir.path().join("b/c.txt"), "help low").unwrap();
//!
//! let finished = linesift::search().run("hlo", dir.path(), false);
//!
//! assert_eq!(finished.items.len(), 2);
//! assert!(finished.items[0].path.ends_with("a.txt"));
//! println!("{}", finished.items[0]); // a.txt:1:5 - hello world ...
//! ```
//!
//! # Interactive use
//!
//! ```rust
//! use std::time::Duration;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("main.py"), "def open_file(path):").unwrap();
//!
//! let (controller, finished) = linesift::search().spawn().unwrap();
//! controller.submit("o", dir.path(), false);
//! controller.submit("op", dir.path(), false);
//! controller.submit("opfl", dir.path(), false);
//!
//! let result = finished.recv_timeout(Duration::from_secs(5)).unwrap();
//! assert_eq!(result.query.text, "opfl");
//! assert_eq!(result.items[0].caret(), (1, 12));
//! ```

#![forbid(unsafe_code)]

mod aggregator;
mod builder;
mod config;
mod controller;
mod engine;
mod entry;
mod error;
mod matcher;
mod query;
mod results;
mod scanner;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::SearchBuilder;
pub use config::{
    SearchConfig, DEFAULT_DEPENDENCY_DIRS, DEFAULT_EXCLUDE_DIRS, DEFAULT_EXCLUDE_EXTENSIONS,
};
pub use controller::QueryController;
pub use entry::{Candidate, Origin};
pub use error::SearchError;
pub use matcher::FuzzyMatcher;
pub use query::{CancelToken, SearchItem, SearchQuery};
pub use results::{Finished, ScanStats};
pub use scanner::DirectoryScanner;
pub use traits::{LineMatch, LineMatcher, Source};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] to configure the engine.
///
/// # Example
///
/// ```rust
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("notes.md"), "the bird sang").unwrap();
///
/// let finished = linesift::search()
///     .max_results(10)
///     .run("brd", dir.path(), false);
///
/// assert_eq!(finished.items.len(), 1);
/// assert_eq!(finished.items[0].column_start, 4);
/// ```
pub fn search() -> SearchBuilder {
    SearchBuilder::default()
}
