use crate::entry::Candidate;
use crate::error::SearchError;
use crate::query::{CancelToken, SearchQuery};

/// Produces the candidate files a query is matched against.
///
/// [`DirectoryScanner`](crate::scanner::DirectoryScanner) is the built-in
/// implementation. Implement this to search a fixed file list, a VCS index,
/// or anything else that resolves to readable files.
///
/// # Streaming
///
/// The returned iterator is drained on a dedicated scanner thread and fed to
/// the matcher workers as it goes, so it should yield lazily. The engine
/// stops pulling from it as soon as the session is superseded. Sources that
/// do work between yielded items (walking pruned directories, skipping
/// filtered files) should check `cancel` as they go and end the iterator once
/// it fires. A fresh iterator is requested per session; it is never
/// restarted.
///
/// # Errors
///
/// Yield `Err` for per-file or per-directory problems (permission denied,
/// binary content, vanished entries). The engine logs them and moves on.
///
/// # Example
///
/// ```rust
/// use linesift::{CancelToken, Candidate, Origin, SearchError, SearchQuery, Source};
///
/// struct FixedFiles(Vec<std::path::PathBuf>);
///
/// impl Source for FixedFiles {
///     fn candidates<'a>(
///         &'a self,
///         _query: &SearchQuery,
///         cancel: CancelToken,
///     ) -> Box<dyn Iterator<Item = Result<Candidate, SearchError>> + 'a> {
///         let files = self.0.iter().take_while(move |_| !cancel.is_cancelled());
///         Box::new(files.map(|path| Ok(Candidate {
///             path:   path.clone(),
///             origin: Origin::Project,
///             depth:  1,
///         })))
///     }
/// }
/// ```
pub trait Source: Send + Sync {
    /// Enumerate candidates for `query` until `cancel` fires.
    fn candidates<'a>(
        &'a self,
        query: &SearchQuery,
        cancel: CancelToken,
    ) -> Box<dyn Iterator<Item = Result<Candidate, SearchError>> + 'a>;
}

/// Where a query matched inside one line, and how well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    /// First matched character, 0-based.
    pub column_start: usize,

    /// One past the last matched character.
    pub column_end: usize,

    /// Higher is better.
    pub score: i64,
}

/// Scores a single line of text against a query.
///
/// Implementations must be pure: the same `(query, line)` always yields the
/// same answer. Workers call this concurrently from every matcher thread.
pub trait LineMatcher: Send + Sync {
    /// `None` when the line does not match at all.
    fn match_line(&self, query: &str, line: &str) -> Option<LineMatch>;
}
