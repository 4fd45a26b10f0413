use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::{DirEntry, WalkBuilder};

use crate::config::SearchConfig;
use crate::entry::{Candidate, Origin};
use crate::error::SearchError;
use crate::query::{CancelToken, SearchQuery};
use crate::traits::Source;

// ---------------------------------------------------------------------------
// DirectoryScanner
// ---------------------------------------------------------------------------

/// The built-in [`Source`]: a lazy, depth-first walk of the query root.
///
/// Entries of each directory are visited in lexical order of name, so two
/// scans of the same tree yield the same candidate sequence. Excluded and
/// (unless opted in) dependency-module directories are pruned before they
/// are read. Files are probed on the way out: excluded extensions, oversized
/// files and files with a NUL byte in their head never become candidates.
///
/// The walk checks its [`CancelToken`] before every directory entry, not just
/// before every candidate, so a superseded scan ends even inside a subtree
/// that yields nothing.
pub struct DirectoryScanner {
    exclude_dirs: Arc<HashSet<OsString>>,
    dependency_dirs: Arc<HashSet<OsString>>,
    dependency_roots: Vec<PathBuf>,
    exclude_extensions: HashSet<String>,
    binary_probe_len: usize,
    max_file_size: u64,
    max_depth: Option<usize>,
}

impl DirectoryScanner {
    pub fn new(config: &SearchConfig) -> Self {
        let names = |list: &[String]| list.iter().map(OsString::from).collect::<HashSet<_>>();
        Self {
            exclude_dirs: Arc::new(names(&config.exclude_dirs)),
            dependency_dirs: Arc::new(names(&config.dependency_dirs)),
            dependency_roots: config.dependency_roots.clone(),
            exclude_extensions: config
                .exclude_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            binary_probe_len: config.binary_probe_len,
            max_file_size: config.max_file_size,
            max_depth: config.max_depth,
        }
    }

    fn walk<'a>(
        &'a self,
        root: PathBuf,
        origin: Origin,
        include_dependencies: bool,
        cancel: CancelToken,
    ) -> impl Iterator<Item = Result<Candidate, SearchError>> + 'a {
        let mut builder = WalkBuilder::new(&root);
        builder
            .standard_filters(false)
            .ignore(false)
            .parents(false)
            .hidden(false)
            .follow_links(false)
            .same_file_system(false)
            .max_depth(self.max_depth)
            .sort_by_file_name(|a, b| a.cmp(b));

        let exclude      = Arc::clone(&self.exclude_dirs);
        let dependencies = Arc::clone(&self.dependency_dirs);
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            let name = entry.file_name();
            !(exclude.contains(name) || (!include_dependencies && dependencies.contains(name)))
        });

        builder
            .build()
            .take_while(move |_| !cancel.is_cancelled())
            .filter_map(move |res| self.classify(res, &root, origin))
    }

    fn classify(
        &self,
        res: Result<DirEntry, ignore::Error>,
        root: &Path,
        origin: Origin,
    ) -> Option<Result<Candidate, SearchError>> {
        let entry = match res {
            Ok(e) => e,
            Err(e) => return Some(Err(map_ignore_error(e))),
        };

        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_file()) {
            return None;
        }
        if self.has_excluded_extension(entry.path()) {
            return None;
        }

        let origin = match origin {
            Origin::Project if self.in_dependency_dir(entry.path(), root) => Origin::Dependency,
            other => other,
        };
        let depth = entry.depth();
        let path  = entry.into_path();

        Some(self.probe(&path).map(|()| Candidate { path, origin, depth }))
    }

    fn has_excluded_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.exclude_extensions.contains(&e.to_ascii_lowercase()))
    }

    fn in_dependency_dir(&self, path: &Path, root: &Path) -> bool {
        path.strip_prefix(root)
            .map(|rel| {
                rel.parent()
                    .into_iter()
                    .flat_map(|p| p.components())
                    .any(|c| self.dependency_dirs.contains(c.as_os_str()))
            })
            .unwrap_or(false)
    }

    /// Size check plus a read of the file head looking for a NUL byte.
    fn probe(&self, path: &Path) -> Result<(), SearchError> {
        let io_err = |e| SearchError::from_io(path.to_path_buf(), e);

        let size = std::fs::metadata(path).map_err(io_err)?.len();
        if size > self.max_file_size {
            return Err(SearchError::TooLarge {
                path: path.to_path_buf(),
                size,
            });
        }

        let mut head = Vec::with_capacity(self.binary_probe_len);
        File::open(path)
            .and_then(|f| f.take(self.binary_probe_len as u64).read_to_end(&mut head))
            .map_err(io_err)?;

        if looks_binary(&head) {
            return Err(SearchError::BinaryContent(path.to_path_buf()));
        }
        Ok(())
    }
}

impl Source for DirectoryScanner {
    fn candidates<'a>(
        &'a self,
        query: &SearchQuery,
        cancel: CancelToken,
    ) -> Box<dyn Iterator<Item = Result<Candidate, SearchError>> + 'a> {
        if !query.root.is_dir() {
            return Box::new(std::iter::once(Err(SearchError::InvalidRoot(
                query.root.clone(),
            ))));
        }

        let include      = query.include_dependency_modules;
        let project      = self.walk(query.root.clone(), Origin::Project, include, cancel.clone());
        let dependencies = self
            .dependency_roots
            .iter()
            .filter(move |r| include && r.is_dir())
            .flat_map(move |r| self.walk(r.clone(), Origin::Dependency, true, cancel.clone()));

        Box::new(project.chain(dependencies))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn looks_binary(head: &[u8]) -> bool {
    head.contains(&0)
}

fn map_ignore_error(e: ignore::Error) -> SearchError {
    match e {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(io_err) => SearchError::from_io(path, io_err),
            other => SearchError::Walk(format!("{}: {}", path.display(), other)),
        },
        ignore::Error::WithDepth { err, .. } => map_ignore_error(*err),
        ignore::Error::Loop { child, .. } => SearchError::SymlinkLoop(child),
        ignore::Error::Io(io_err) => SearchError::Io {
            path: PathBuf::new(),
            source: io_err,
        },
        other => SearchError::Walk(other.to_string()),
    }
}
