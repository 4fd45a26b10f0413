use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    // Traversal
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("path not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid search root: {0}")]
    InvalidRoot(PathBuf),

    #[error("symlink loop: {0}")]
    SymlinkLoop(PathBuf),

    // Content
    #[error("binary content: {0}")]
    BinaryContent(PathBuf),

    #[error("file too large ({size} bytes): {path}")]
    TooLarge { path: PathBuf, size: u64 },

    #[error("IO error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(String),

    // Runtime
    #[error("failed to spawn search thread: {0}")]
    ThreadSpawn(String),
}

impl SearchError {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::InvalidRoot(p)
            | Self::SymlinkLoop(p)
            | Self::BinaryContent(p)
            | Self::TooLarge { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the session keeps going after this error.
    ///
    /// Everything tied to a single file or directory is recoverable: the
    /// file is skipped and the walk continues. An invalid root or a failed
    /// thread spawn ends the session with zero results instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidRoot(_) | Self::ThreadSpawn(_))
    }

    /// Build from an I/O error, promoting the kinds callers care about.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source: err },
        }
    }
}
