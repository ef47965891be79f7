//! Error types for jitbox-core.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for jitbox-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a sandbox run.
///
/// Compiler and runtime failures are not errors: they are reported through
/// [`RunOutcome`](crate::pipeline::RunOutcome) and shown to the sink.
#[derive(Debug, Error)]
pub enum Error {
    /// Workspace creation, source write, reset or log access failed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source text could not be scanned for a package or type name.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration could not be loaded or persisted.
    #[error("config error: {0}")]
    Config(String),

    /// The compiler or runtime binary is missing or could not be started.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// The analysis model rejected the diagnostic log.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// A pipeline operation was requested in a state that does not allow it.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Another run holds the workspace lock.
    #[error("workspace busy: {} is locked by another run", .0.display())]
    WorkspaceBusy(PathBuf),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Render the error together with a short recovery hint.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Self::Filesystem { .. } => "check permissions on the sandbox directory, or run `jitbox reset`",
            Self::Parse(_) => "each source must declare a class, interface, enum or record",
            Self::Config(_) => "fix or delete the config file to fall back to defaults",
            Self::Toolchain(_) => "install a JDK and set JAVA_HOME, or put javac and java on PATH",
            Self::Analysis(_) => "the diagnostic log may be truncated; rerun the sandbox",
            Self::InvalidOperation(_) => "start a new run",
            Self::WorkspaceBusy(_) => "wait for the other run to finish",
        };
        format!("{self}\n  hint: {hint}")
    }
}

/// Attach a path to I/O results, producing [`Error::Filesystem`].
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| Error::filesystem(path, e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_display_includes_path() {
        let err = Error::filesystem(
            "/tmp/sandbox/sources",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/sandbox/sources"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_hint_appended() {
        let err = Error::Toolchain("javac not found".to_string());
        let rendered = err.with_hint();
        assert!(rendered.starts_with("toolchain error: javac not found"));
        assert!(rendered.contains("JAVA_HOME"));
    }

    #[test]
    fn test_io_context() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        match res.at(Path::new("missing.log")) {
            Err(Error::Filesystem { path, .. }) => assert_eq!(path, PathBuf::from("missing.log")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
