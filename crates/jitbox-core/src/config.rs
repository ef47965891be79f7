//! Sandbox configuration and its persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IoContext, Result};

/// Runtime default for `-XX:FreqInlineSize`.
pub const DEFAULT_FREQ_INLINE_SIZE: u32 = 325;

/// Runtime default for `-XX:MaxInlineSize`.
pub const DEFAULT_MAX_INLINE_SIZE: u32 = 35;

/// Runtime default for `-XX:CompilerThreshold`.
pub const DEFAULT_COMPILER_THRESHOLD: u32 = 10_000;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Three-way switch for runtime modes that have their own default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// Leave the runtime's choice alone.
    #[default]
    Auto,
    ForceOn,
    ForceOff,
}

/// Settings that shape a sandbox run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Source roots the analysis side uses to show source.
    pub source_locations: Vec<String>,

    /// Class roots; appended to the execution classpath.
    pub class_locations: Vec<String>,

    /// Ask the runtime to disassemble compiled code.
    pub print_assembly: bool,

    /// Use Intel syntax for disassembly (only with `print_assembly`).
    pub intel_syntax: bool,

    pub tiered_compilation: TriState,

    pub compressed_oops: TriState,

    pub freq_inline_size: u32,

    pub max_inline_size: u32,

    pub compiler_threshold: u32,

    /// Upper bound on a compiler invocation, in seconds.
    pub compile_timeout_secs: u64,

    /// Upper bound on the executed program, in seconds.
    pub execute_timeout_secs: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            source_locations: Vec::new(),
            class_locations: Vec::new(),
            print_assembly: false,
            intel_syntax: false,
            tiered_compilation: TriState::Auto,
            compressed_oops: TriState::Auto,
            freq_inline_size: DEFAULT_FREQ_INLINE_SIZE,
            max_inline_size: DEFAULT_MAX_INLINE_SIZE,
            compiler_threshold: DEFAULT_COMPILER_THRESHOLD,
            compile_timeout_secs: DEFAULT_TIMEOUT_SECS,
            execute_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SandboxConfig {
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }
}

/// Persists a [`SandboxConfig`].
pub trait ConfigStore {
    fn save(&self, config: &SandboxConfig) -> Result<()>;
}

/// Stores the config as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config, falling back to defaults when the file is absent.
    pub fn load(&self) -> Result<SandboxConfig> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", self.path.display());
                Ok(SandboxConfig::default())
            }
            Err(e) => Err(crate::Error::filesystem(&self.path, e)),
        }
    }
}

impl ConfigStore for JsonConfigStore {
    fn save(&self, config: &SandboxConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json).at(&self.path)?;
        tracing::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}
