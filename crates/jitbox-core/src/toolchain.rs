//! JDK discovery.
//!
//! Locates the `javac` and `java` binaries the sandbox drives, and the
//! runtime source archive the analysis side can show library code from.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const JAVA_HOME: &str = "JAVA_HOME";

/// Paths to the JDK tools used by the sandbox.
#[derive(Debug, Clone)]
pub struct JavaToolchain {
    /// Path to javac
    javac_path: PathBuf,

    /// Path to java
    java_path: PathBuf,

    /// JDK home, when one could be determined
    java_home: Option<PathBuf>,
}

impl JavaToolchain {
    /// Detect the toolchain from `JAVA_HOME`, then `PATH`.
    pub fn new() -> Result<Self> {
        let java_home = std::env::var_os(JAVA_HOME).map(PathBuf::from);
        Self::detect(java_home.as_deref())
    }

    /// Detect the toolchain preferring binaries under `java_home`.
    pub fn detect(java_home: Option<&Path>) -> Result<Self> {
        let javac_path = Self::find_tool("javac", java_home)?;
        let java_path = Self::find_tool("java", java_home)?;

        let java_home = java_home
            .map(Path::to_path_buf)
            .or_else(|| Self::home_from_binary(&java_path));

        tracing::debug!(
            "Using javac at {}, java at {}",
            javac_path.display(),
            java_path.display()
        );

        Ok(Self {
            javac_path,
            java_path,
            java_home,
        })
    }

    /// Build a toolchain from explicit binary paths.
    pub fn from_paths(javac_path: PathBuf, java_path: PathBuf) -> Self {
        let java_home = Self::home_from_binary(&java_path);
        Self {
            javac_path,
            java_path,
            java_home,
        }
    }

    pub fn javac_path(&self) -> &Path {
        &self.javac_path
    }

    pub fn java_path(&self) -> &Path {
        &self.java_path
    }

    pub fn java_home(&self) -> Option<&Path> {
        self.java_home.as_deref()
    }

    /// The JDK's `src.zip`, if one ships with this JDK.
    ///
    /// Older JDKs keep it at the top of the JDK home, or next to a nested
    /// `jre` home; newer ones under `lib`.
    pub fn source_archive(&self) -> Option<PathBuf> {
        let home = self.java_home.as_deref()?;

        let mut candidates = vec![home.join("src.zip"), home.join("lib").join("src.zip")];
        if let Some(parent) = home.parent() {
            candidates.push(parent.join("src.zip"));
        }

        candidates.into_iter().find(|p| p.is_file())
    }

    fn find_tool(name: &str, java_home: Option<&Path>) -> Result<PathBuf> {
        if let Some(home) = java_home {
            let bin = home.join("bin");
            if let Ok(path) = which::which_in(name, Some(&bin), &bin) {
                return Ok(path);
            }
        }

        which::which(name).map_err(|_| Error::Toolchain(format!("{name} not found in JAVA_HOME or PATH")))
    }

    /// `<home>/bin/java` resolves to `<home>`, following symlinks.
    fn home_from_binary(java: &Path) -> Option<PathBuf> {
        let resolved = java.canonicalize().ok()?;
        resolved.parent()?.parent().map(Path::to_path_buf)
    }
}
