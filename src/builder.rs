use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::config::SearchConfig;
use crate::controller::QueryController;
use crate::engine::{self, EngineOptions};
use crate::error::SearchError;
use crate::matcher::FuzzyMatcher;
use crate::query::{GenerationClock, SearchQuery, SearchSession};
use crate::results::Finished;
use crate::scanner::DirectoryScanner;
use crate::traits::{LineMatcher, Source};

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring the search engine.
///
/// Created via [`linesift::search()`](crate::search). Configure with chained
/// builder methods, then either [`spawn()`](SearchBuilder::spawn) a
/// [`QueryController`] for interactive use or [`run()`](SearchBuilder::run) a
/// single blocking search.
///
/// # Example
///
/// ```rust,ignore
/// let (controller, finished) = linesift::search()
///     .max_results(200)
///     .threads(4)
///     .exclude_dir("vendor")
///     .spawn()?;
///
/// controller.submit("opn fl", "/home/me/project", false);
/// let results = finished.recv()?;
/// ```
pub struct SearchBuilder {
    source:  Option<Box<dyn Source>>,
    matcher: Option<Box<dyn LineMatcher>>,
    config:  SearchConfig,
}

impl Default for SearchBuilder {
    fn default() -> Self {
        Self {
            source:  None,
            matcher: None,
            config:  SearchConfig::default(),
        }
    }
}

impl SearchBuilder {
    // ── Source ────────────────────────────────────────────────────────────

    /// Replace the built-in [`DirectoryScanner`] with a custom source.
    ///
    /// The scanning options on this builder (exclusions, probe length, size
    /// limit, depth) only configure the built-in scanner.
    pub fn source(mut self, s: impl Source + 'static) -> Self {
        self.source = Some(Box::new(s));
        self
    }

    // ── Matcher ───────────────────────────────────────────────────────────

    /// Replace the built-in [`FuzzyMatcher`].
    pub fn with_matcher(mut self, m: impl LineMatcher + 'static) -> Self {
        self.matcher = Some(Box::new(m));
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Replace every option at once.
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Keep at most `n` items per finished result list. The highest-ranked
    /// matches are kept, not the first ones found.
    pub fn max_results(mut self, n: usize) -> Self {
        self.config.max_results = n;
        self
    }

    /// Number of matcher threads per session. Defaults to the number of
    /// logical CPU cores.
    pub fn threads(mut self, n: usize) -> Self {
        self.config.threads = n;
        self
    }

    /// How long a submission must go unsuperseded before it starts scanning.
    /// `Duration::ZERO` starts every submission immediately.
    pub fn debounce(mut self, d: Duration) -> Self {
        self.config.debounce = d;
        self
    }

    /// Maximum traversal depth. `1` means files directly in the root only.
    pub fn max_depth(mut self, d: usize) -> Self {
        self.config.max_depth = Some(d);
        self
    }

    /// Never descend into directories with this name.
    pub fn exclude_dir(mut self, name: impl Into<String>) -> Self {
        self.config.exclude_dirs.push(name.into());
        self
    }

    /// Treat directories with this name as dependency-module roots.
    pub fn dependency_dir(mut self, name: impl Into<String>) -> Self {
        self.config.dependency_dirs.push(name.into());
        self
    }

    /// Walk `root` after the project root whenever a query opts into
    /// dependency modules.
    pub fn dependency_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.dependency_roots.push(root.into());
        self
    }

    /// Skip files with this extension (with or without the leading dot).
    pub fn exclude_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.exclude_extensions.push(ext.into());
        self
    }

    /// Bytes inspected for a NUL byte before a file is accepted as text.
    pub fn binary_probe_len(mut self, n: usize) -> Self {
        self.config.binary_probe_len = n;
        self
    }

    /// Skip files larger than `bytes`.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    /// Lines matched between two cancellation checks.
    pub fn line_batch(mut self, n: usize) -> Self {
        self.config.line_batch = n;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Start the background controller.
    ///
    /// Returns the controller and the receiving end of its finished events.
    /// Exactly one [`Finished`] arrives per submission that is not
    /// superseded before it completes.
    ///
    /// # Errors
    ///
    /// Fails only if the coordinator thread cannot be spawned.
    pub fn spawn(self) -> Result<(QueryController, Receiver<Finished>), SearchError> {
        let debounce = self.config.debounce;
        QueryController::spawn(self.into_options(), debounce)
    }

    /// Run one search on the calling thread and wait for its result.
    ///
    /// Uses the same scanner, matcher and ranking as [`spawn()`](Self::spawn).
    /// An empty `text` or an unusable root yields an empty result list.
    pub fn run(
        self,
        text: impl Into<String>,
        root: impl Into<PathBuf>,
        include_dependency_modules: bool,
    ) -> Finished {
        let clock = GenerationClock::new();
        let query = SearchQuery {
            text:       text.into(),
            root:       root.into(),
            include_dependency_modules,
            generation: clock.advance(),
        };
        let session = SearchSession::new(query, &clock);
        let opts    = self.into_options();

        // Nothing else holds the clock, so the session cannot be superseded.
        engine::run(&session, &opts).unwrap_or_else(|| Finished::empty(session.query.clone()))
    }

    fn into_options(self) -> EngineOptions {
        let source: Arc<dyn Source> = match self.source {
            Some(s) => Arc::from(s),
            None    => Arc::new(DirectoryScanner::new(&self.config)),
        };
        let matcher: Arc<dyn LineMatcher> = match self.matcher {
            Some(m) => Arc::from(m),
            None    => Arc::new(FuzzyMatcher),
        };

        EngineOptions {
            source,
            matcher,
            threads:     self.config.threads,
            max_results: self.config.max_results,
            line_batch:  self.config.line_batch,
        }
    }
}
