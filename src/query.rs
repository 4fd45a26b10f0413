use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// SearchQuery
// ---------------------------------------------------------------------------

/// One search attempt, immutable once submitted.
///
/// `generation` is stamped by the [`GenerationClock`] at submit time and
/// uniquely identifies the attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text:                       String,
    pub root:                       PathBuf,
    pub include_dependency_modules: bool,
    pub generation:                 u64,
}

// ---------------------------------------------------------------------------
// SearchItem
// ---------------------------------------------------------------------------

/// Characters of line text kept in [`SearchItem::preview`].
const PREVIEW_CHARS: usize = 50;

/// A single matched line.
///
/// Columns are 0-based character offsets into `line_text`, end-exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    pub path: PathBuf,

    /// 1-based line number.
    pub line_number: usize,

    pub column_start: usize,
    pub column_end:   usize,

    /// The full line, without its line terminator.
    pub line_text: String,

    pub score: i64,
}

impl SearchItem {
    /// File name component of `path`, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Where the caret goes when the item is opened: `(line, column_end)`.
    pub fn caret(&self) -> (usize, usize) {
        (self.line_number, self.column_end)
    }

    /// Short listing text: the line from the match start, trimmed and cut
    /// to a fixed number of characters.
    pub fn preview(&self) -> String {
        let tail: String = self.line_text.chars().skip(self.column_start).collect();
        tail.trim().chars().take(PREVIEW_CHARS).collect()
    }
}

impl fmt::Display for SearchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} - {} ...",
            self.file_name(),
            self.line_number,
            self.column_end,
            self.preview()
        )
    }
}

// ---------------------------------------------------------------------------
// Generations
// ---------------------------------------------------------------------------

/// Monotonic generation counter shared between the controller and every
/// worker of every session.
#[derive(Debug, Default, Clone)]
pub(crate) struct GenerationClock {
    current: Arc<AtomicU64>,
}

impl GenerationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to and return the next generation. Everything stamped with an
    /// older generation is cancelled from this point on.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Token for work stamped with `generation`.
    pub fn token(&self, generation: u64) -> CancelToken {
        CancelToken {
            generation,
            clock: self.clone(),
        }
    }
}

/// Cooperative cancellation handle held by workers and handed to every
/// [`Source`](crate::Source).
///
/// Cancelled as soon as the clock moves past the captured generation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    clock: GenerationClock,
}

impl CancelToken {
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.clock.current() != self.generation
    }
}

// ---------------------------------------------------------------------------
// SearchSession
// ---------------------------------------------------------------------------

/// Run state for one generation, from dispatch to completion or cancellation.
pub(crate) struct SearchSession {
    pub query: SearchQuery,
    pub token: CancelToken,
}

impl SearchSession {
    pub fn new(query: SearchQuery, clock: &GenerationClock) -> Self {
        let token = clock.token(query.generation);
        Self { query, token }
    }

    pub fn generation(&self) -> u64 {
        self.query.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
