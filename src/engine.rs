use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, trace};

use crate::aggregator::ResultAggregator;
use crate::entry::Candidate;
use crate::query::{CancelToken, SearchItem, SearchSession};
use crate::results::{Finished, ScanStats};
use crate::traits::{LineMatcher, Source};

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Everything a session needs besides its query. Cheap to clone; the
/// controller hands one copy to every session thread.
#[derive(Clone)]
pub(crate) struct EngineOptions {
    pub source:      Arc<dyn Source>,
    pub matcher:     Arc<dyn LineMatcher>,
    pub threads:     usize,
    pub max_results: usize,
    pub line_batch:  usize,
}

/// Per-session counters, bumped from every worker.
#[derive(Default)]
struct Counters {
    files:   AtomicUsize,
    skipped: AtomicUsize,
    lines:   AtomicUsize,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Run one session to completion.
///
/// One scoped thread drains the source and streams candidates over a
/// bounded channel to `threads` matcher workers. The source receives the
/// session token and checks it per directory entry; every other thread checks
/// it before each unit of work (a candidate, a line batch) and bails out once
/// the session is superseded.
///
/// Returns `None` when the session was superseded before it finished; its
/// partial results are discarded.
pub(crate) fn run(session: &SearchSession, opts: &EngineOptions) -> Option<Finished> {
    let query      = &session.query;
    let generation = session.generation();
    if query.text.is_empty() {
        return Some(Finished::empty(query.clone()));
    }

    let start      = Instant::now();
    let token      = &session.token;
    let aggregator = ResultAggregator::new(token.clone(), opts.max_results);
    let counters   = Counters::default();
    let workers    = opts.threads.max(1);

    debug!(
        generation,
        query = %query.text,
        root = %query.root.display(),
        dependencies = query.include_dependency_modules,
        "session started"
    );

    thread::scope(|s| {
        let (tx, rx) = crossbeam_channel::bounded::<Candidate>(workers * 4);
        let source   = opts.source.as_ref();
        let counters = &counters;

        s.spawn(move || {
            for res in source.candidates(query, token.clone()) {
                if token.is_cancelled() {
                    break;
                }
                match res {
                    Ok(candidate) => {
                        if tx.send(candidate).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_recoverable() => {
                        counters.skipped.fetch_add(1, Ordering::Relaxed);
                        debug!(generation, error = %e, "skipped");
                    }
                    Err(e) => {
                        debug!(generation, error = %e, "scan aborted");
                        break;
                    }
                }
            }
        });

        for _ in 0..workers {
            let rx = rx.clone();
            let aggregator = &aggregator;
            s.spawn(move || {
                for candidate in rx {
                    if token.is_cancelled() {
                        break;
                    }
                    search_file(&candidate.path, &query.text, token, opts, aggregator, counters);
                }
            });
        }
        drop(rx);
    });

    if session.is_cancelled() {
        debug!(generation, elapsed = ?start.elapsed(), "session superseded");
        return None;
    }

    let matches = aggregator.offered();
    let items   = aggregator.finish();
    let stats   = ScanStats {
        files_searched: counters.files.load(Ordering::Relaxed),
        files_skipped:  counters.skipped.load(Ordering::Relaxed),
        lines:          counters.lines.load(Ordering::Relaxed),
        matches,
        duration:       start.elapsed(),
    };

    debug!(
        generation,
        files = stats.files_searched,
        skipped = stats.files_skipped,
        matches = stats.matches,
        kept = items.len(),
        elapsed = ?stats.duration,
        "session finished"
    );

    Some(Finished {
        generation,
        query: query.clone(),
        items,
        stats,
    })
}

// ---------------------------------------------------------------------------
// Per-file matching
// ---------------------------------------------------------------------------

fn search_file(
    path: &Path,
    query: &str,
    token: &CancelToken,
    opts: &EngineOptions,
    aggregator: &ResultAggregator,
    counters: &Counters,
) {
    // The file may have changed or vanished since the scanner probed it.
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(path = %path.display(), error = %e, "unreadable, skipped");
            return;
        }
    };
    counters.files.fetch_add(1, Ordering::Relaxed);

    let body      = bytes.strip_suffix(b"\n").unwrap_or(&bytes);
    let batch     = opts.line_batch.max(1);
    let mut found = Vec::new();
    let mut lines = 0;

    for (idx, raw) in body.split(|&b| b == b'\n').enumerate() {
        if idx % batch == 0 && token.is_cancelled() {
            return;
        }
        lines += 1;

        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let Ok(line) = std::str::from_utf8(raw) else {
            continue;
        };

        if let Some(m) = opts.matcher.match_line(query, line) {
            found.push(SearchItem {
                path:         path.to_path_buf(),
                line_number:  idx + 1,
                column_start: m.column_start,
                column_end:   m.column_end,
                line_text:    line.to_string(),
                score:        m.score,
            });
        }
    }

    counters.lines.fetch_add(lines, Ordering::Relaxed);
    trace!(path = %path.display(), lines, matches = found.len(), "searched");
    aggregator.offer(found, token.generation());
}
