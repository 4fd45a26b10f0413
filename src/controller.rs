use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::engine::{self, EngineOptions};
use crate::error::SearchError;
use crate::query::{GenerationClock, SearchQuery, SearchSession};
use crate::results::Finished;

enum Command {
    Run(SearchQuery),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Owns the generation clock and the outbound channel.
///
/// Advancing the clock and publishing a result both happen under `out`, so a
/// result is sent only if its generation is still current at that instant.
struct Publisher {
    clock: GenerationClock,
    out:   Mutex<Sender<Finished>>,
}

impl Publisher {
    /// Stamp a new query, superseding whatever was active. Empty queries are
    /// answered on the spot with an empty list.
    fn begin(
        &self,
        text: String,
        root: PathBuf,
        include_dependency_modules: bool,
    ) -> Option<SearchQuery> {
        let out   = self.out.lock();
        let query = SearchQuery {
            text,
            root,
            include_dependency_modules,
            generation: self.clock.advance(),
        };

        if query.text.is_empty() {
            trace!(generation = query.generation, "empty query");
            let _ = out.send(Finished::empty(query));
            return None;
        }
        Some(query)
    }

    fn cancel(&self) {
        let _out = self.out.lock();
        self.clock.advance();
    }

    fn publish(&self, finished: Finished) -> bool {
        let out = self.out.lock();
        if finished.generation != self.clock.current() {
            return false;
        }
        out.send(finished).is_ok()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.clock.current() == generation
    }
}

// ---------------------------------------------------------------------------
// QueryController
// ---------------------------------------------------------------------------

/// Accepts queries as fast as the user types and reports one [`Finished`]
/// per query that survives long enough to complete.
///
/// Created by [`SearchBuilder::spawn`](crate::SearchBuilder::spawn). Every
/// [`submit`](Self::submit) supersedes the previous query: its session is
/// cancelled cooperatively and never reports. Submissions arriving within the
/// debounce interval of each other are coalesced so that only the newest one
/// starts scanning.
///
/// Dropping the controller cancels the active session and joins the
/// background threads.
pub struct QueryController {
    publisher:   Arc<Publisher>,
    commands:    Sender<Command>,
    coordinator: Option<JoinHandle<()>>,
}

impl QueryController {
    pub(crate) fn spawn(
        opts: EngineOptions,
        debounce: Duration,
    ) -> Result<(Self, Receiver<Finished>), SearchError> {
        let (out_tx, out_rx) = crossbeam_channel::unbounded();
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let publisher = Arc::new(Publisher {
            clock: GenerationClock::new(),
            out:   Mutex::new(out_tx),
        });

        let coordinator = {
            let publisher = Arc::clone(&publisher);
            thread::Builder::new()
                .name("linesift-coordinator".into())
                .spawn(move || coordinate(cmd_rx, publisher, opts, debounce))
                .map_err(|e| SearchError::ThreadSpawn(e.to_string()))?
        };

        Ok((
            Self {
                publisher,
                commands:    cmd_tx,
                coordinator: Some(coordinator),
            },
            out_rx,
        ))
    }

    /// Search `root` for `text`. Never blocks on search work and never fails;
    /// an unusable root simply finishes with no results.
    pub fn submit(
        &self,
        text: impl Into<String>,
        root: impl Into<PathBuf>,
        include_dependency_modules: bool,
    ) {
        let Some(query) = self
            .publisher
            .begin(text.into(), root.into(), include_dependency_modules)
        else {
            return;
        };

        if self.commands.send(Command::Run(query)).is_err() {
            warn!("search coordinator is gone, query dropped");
        }
    }

    /// Supersede the active query without starting a new one. Nothing is
    /// reported for it.
    pub fn cancel(&self) {
        self.publisher.cancel();
    }

    /// Generation of the most recent submission (or cancellation).
    pub fn generation(&self) -> u64 {
        self.publisher.clock.current()
    }
}

impl Drop for QueryController {
    fn drop(&mut self) {
        self.publisher.cancel();
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.coordinator.take() {
            let _ = handle.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

fn coordinate(
    commands: Receiver<Command>,
    publisher: Arc<Publisher>,
    opts: EngineOptions,
    debounce: Duration,
) {
    let mut sessions: Vec<JoinHandle<()>> = Vec::new();

    'accept: while let Ok(Command::Run(mut query)) = commands.recv() {
        // Keep the newest submission until the channel stays quiet.
        loop {
            match commands.recv_timeout(debounce) {
                Ok(Command::Run(newer)) => query = newer,
                Err(RecvTimeoutError::Timeout) => break,
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break 'accept,
            }
        }

        let generation = query.generation;
        if !publisher.is_current(generation) {
            trace!(generation, "superseded before scanning");
            continue;
        }

        sessions.retain(|h| !h.is_finished());

        let session = SearchSession::new(query, &publisher.clock);
        let publisher = Arc::clone(&publisher);
        let opts = opts.clone();
        let spawned = thread::Builder::new()
            .name(format!("linesift-session-{generation}"))
            .spawn(move || {
                let Some(finished) = engine::run(&session, &opts) else {
                    return;
                };
                if !publisher.publish(finished) {
                    debug!(generation, "superseded at publish");
                }
            });

        match spawned {
            Ok(handle) => sessions.push(handle),
            Err(e) => {
                let err = SearchError::ThreadSpawn(e.to_string());
                warn!(generation, error = %err, "session not started");
            }
        }
    }

    for handle in sessions {
        let _ = handle.join();
    }
}
