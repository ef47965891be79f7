//! Sandbox workspace management.
//!
//! Owns the directories a sandbox run writes into. All paths are resolved
//! once, when the [`Workspace`] is constructed, and are absolute:
//!
//! ```text
//! <root>/
//! ├── sandbox.lock     # run-level lock (survives reset)
//! └── sandbox/
//!     ├── sources/     # written source units (seeded with examples)
//!     ├── classes/     # compiler output
//!     └── sandbox.log  # diagnostic log written by the runtime
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, IoContext, Result};

const SANDBOX_DIR: &str = "sandbox";
const SOURCES_DIR: &str = "sources";
const CLASSES_DIR: &str = "classes";
const LOG_FILE: &str = "sandbox.log";
const LOCK_FILE: &str = "sandbox.lock";

/// Example sources compiled into the library.
const BUNDLED_SAMPLES: &[(&str, &str)] = &[
    ("SandboxTest.java", include_str!("../samples/SandboxTest.java")),
    ("InlineExample.java", include_str!("../samples/InlineExample.java")),
];

/// Where the source directory gets its initial contents from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Seed {
    /// Leave the source directory empty.
    None,
    /// Write the examples bundled with the library.
    #[default]
    Bundled,
    /// Copy every file under this directory.
    Directory(PathBuf),
}

/// Directory structure for sandbox runs.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// The `sandbox` directory itself; emptied by [`reset`](Self::reset).
    pub sandbox_dir: PathBuf,

    /// Source root that units are written under.
    pub source_dir: PathBuf,

    /// Output root handed to the compiler and put first on the classpath.
    pub class_dir: PathBuf,

    /// Diagnostic log the runtime is told to write.
    pub log_file: PathBuf,

    lock_file: PathBuf,
    seed: Seed,
}

impl Workspace {
    /// Resolve the sandbox layout under `root`.
    ///
    /// Nothing is created on disk until [`ensure_ready`](Self::ensure_ready).
    pub fn new(root: &Path) -> Result<Self> {
        let root = std::path::absolute(root).at(root)?;
        let sandbox_dir = root.join(SANDBOX_DIR);

        Ok(Self {
            source_dir: sandbox_dir.join(SOURCES_DIR),
            class_dir: sandbox_dir.join(CLASSES_DIR),
            log_file: sandbox_dir.join(LOG_FILE),
            lock_file: root.join(LOCK_FILE),
            sandbox_dir,
            seed: Seed::default(),
        })
    }

    /// Choose how a freshly created source directory is populated.
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Create the source and class directories if they are missing.
    ///
    /// The source directory is seeded only when this call created it, so
    /// user edits survive repeated calls. Returns `true` if seeding happened.
    pub fn ensure_ready(&self) -> Result<bool> {
        let mut seeded = false;

        if !self.source_dir.exists() {
            fs::create_dir_all(&self.source_dir).at(&self.source_dir)?;
            self.copy_seed()?;
            seeded = self.seed != Seed::None;
        }

        fs::create_dir_all(&self.class_dir).at(&self.class_dir)?;

        Ok(seeded)
    }

    /// Delete everything under the sandbox directory and recreate it.
    pub fn reset(&self) -> Result<()> {
        if self.sandbox_dir.exists() {
            empty_dir(&self.sandbox_dir)?;
        }
        tracing::info!("Reset sandbox at {}", self.sandbox_dir.display());
        self.ensure_ready()?;
        Ok(())
    }

    /// Take the exclusive run-level lock.
    ///
    /// Fails with [`Error::WorkspaceBusy`] instead of blocking when another
    /// run holds it. The lock is released when the guard is dropped.
    pub fn lock(&self) -> Result<WorkspaceLock> {
        if let Some(parent) = self.lock_file.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_file)
            .at(&self.lock_file)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(WorkspaceLock { file }),
            Err(e) if is_contended(&e) => Err(Error::WorkspaceBusy(self.lock_file.clone())),
            Err(e) => Err(Error::filesystem(&self.lock_file, e)),
        }
    }

    fn copy_seed(&self) -> Result<()> {
        match &self.seed {
            Seed::None => {}
            Seed::Bundled => {
                for (name, contents) in BUNDLED_SAMPLES {
                    let dest = self.source_dir.join(name);
                    fs::write(&dest, contents).at(&dest)?;
                }
                tracing::debug!("Seeded {} bundled examples", BUNDLED_SAMPLES.len());
            }
            Seed::Directory(dir) => {
                copy_tree(dir, &self.source_dir)?;
                tracing::debug!("Seeded examples from {}", dir.display());
            }
        }
        Ok(())
    }
}

/// Guard for the workspace run-level lock.
#[derive(Debug)]
pub struct WorkspaceLock {
    file: File,
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release workspace lock: {}", e);
        }
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Remove every entry inside `dir`, keeping `dir` itself.
fn empty_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).at(&path)?;
        } else {
            fs::remove_file(&path).at(&path)?;
        }
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in fs::read_dir(from).at(from)? {
        let path = entry.at(from)?.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        let dest = to.join(name);

        if path.is_dir() {
            fs::create_dir_all(&dest).at(&dest)?;
            copy_tree(&path, &dest)?;
        } else {
            fs::copy(&path, &dest).at(&path)?;
        }
    }
    Ok(())
}
