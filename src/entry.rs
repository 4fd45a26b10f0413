use std::path::PathBuf;

/// A candidate file produced by a [`Source`](crate::traits::Source).
///
/// Candidates have already passed the cheap filters (exclusion lists,
/// binary probe, size limit); the engine reads them in full and runs the
/// line matcher over every line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full path to the file.
    pub path: PathBuf,

    /// Which tree the file was found under.
    pub origin: Origin,

    /// How deep below its root the file sits. Files directly in the root = 1.
    pub depth: usize,
}

/// The tree a candidate came from.
///
/// Dependency-module matches rank exactly like project matches; the origin
/// only exists so callers and tests can tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The project root the query was submitted with.
    Project,

    /// A dependency-module tree, searched only when opted in.
    Dependency,
}
