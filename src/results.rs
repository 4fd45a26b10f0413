use std::time::Duration;

use crate::query::{SearchItem, SearchQuery};

/// The outcome of one completed, non-superseded search.
///
/// This is the only thing a search ever reports: superseded sessions end
/// silently, and partial results are never exposed.
#[derive(Debug, Clone)]
pub struct Finished {
    /// Generation of the query this answers.
    pub generation: u64,

    pub query: SearchQuery,

    /// Ranked best-first, capped at the configured maximum.
    pub items: Vec<SearchItem>,

    pub stats: ScanStats,
}

impl Finished {
    pub(crate) fn empty(query: SearchQuery) -> Self {
        Self {
            generation: query.generation,
            query,
            items:      Vec::new(),
            stats:      ScanStats::default(),
        }
    }
}

/// Counters for a completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Files read and matched line by line.
    pub files_searched: usize,

    /// Candidates dropped: binary, oversized, unreadable, vanished.
    pub files_skipped: usize,

    pub lines: usize,

    /// Matching lines found, before the result cap was applied.
    pub matches: usize,

    /// Wall-clock time from dispatch to completion.
    pub duration: Duration,
}
