//! Compilation of written source units.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::process::run_bounded;
use crate::toolchain::JavaToolchain;

/// Outcome of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationResult {
    pub success: bool,

    /// Compiler diagnostics, shown to the user on failure.
    pub messages: String,
}

impl CompilationResult {
    pub fn succeeded(messages: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: messages.into(),
        }
    }

    pub fn failed(messages: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: messages.into(),
        }
    }
}

/// Builds source files into an output directory.
///
/// `Err` is reserved for being unable to run the compiler at all; source
/// errors come back as an unsuccessful [`CompilationResult`].
pub trait Compiler {
    fn compile(&self, files: &[PathBuf], output_dir: &Path) -> Result<CompilationResult>;
}

/// Runs `javac -d <output_dir> <files...>`.
#[derive(Debug, Clone)]
pub struct JavacCompiler {
    toolchain: JavaToolchain,
    timeout: Duration,
}

impl JavacCompiler {
    pub fn new(toolchain: JavaToolchain, timeout: Duration) -> Self {
        Self { toolchain, timeout }
    }
}

impl Compiler for JavacCompiler {
    fn compile(&self, files: &[PathBuf], output_dir: &Path) -> Result<CompilationResult> {
        let mut cmd = Command::new(self.toolchain.javac_path());
        cmd.arg("-g").arg("-d").arg(output_dir).args(files);

        let start = Instant::now();
        let output = run_bounded(cmd, self.timeout)?;
        tracing::debug!("javac finished in {:?}", start.elapsed());

        if output.timed_out {
            return Ok(CompilationResult::failed(format!(
                "compilation timed out after {:?}",
                self.timeout
            )));
        }

        let success = output.success();

        // javac writes diagnostics to stderr
        let mut messages = output.stderr;
        if !output.stdout.trim().is_empty() {
            messages.push_str(&output.stdout);
        }

        Ok(CompilationResult {
            success,
            messages,
        })
    }
}
