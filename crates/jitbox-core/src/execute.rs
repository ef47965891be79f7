//! Execution of the compiled entry point under diagnostic flags.

use std::process::Command;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::process::run_bounded;
use crate::toolchain::JavaToolchain;

/// Outcome of running the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,

    /// Captured error stream, shown to the user on failure.
    pub error_output: String,
}

impl ExecutionResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error_output: String::new(),
        }
    }

    pub fn failed(error_output: impl Into<String>) -> Self {
        Self {
            success: false,
            error_output: error_output.into(),
        }
    }
}

/// Runs a compiled entry point.
///
/// `Err` means the runtime could not be started; a program that exits
/// badly is an unsuccessful [`ExecutionResult`].
pub trait Executor {
    fn execute(&self, entry_name: &str, classpath: &[String], options: &[String]) -> Result<ExecutionResult>;
}

/// Runs `java <options> -cp <classpath> <entry>`.
#[derive(Debug, Clone)]
pub struct JavaExecutor {
    toolchain: JavaToolchain,
    timeout: Duration,
}

impl JavaExecutor {
    pub fn new(toolchain: JavaToolchain, timeout: Duration) -> Self {
        Self { toolchain, timeout }
    }
}

impl Executor for JavaExecutor {
    fn execute(&self, entry_name: &str, classpath: &[String], options: &[String]) -> Result<ExecutionResult> {
        let classpath = std::env::join_paths(classpath)
            .map_err(|e| Error::Toolchain(format!("invalid classpath entry: {e}")))?;

        let mut cmd = Command::new(self.toolchain.java_path());
        cmd.args(options).arg("-cp").arg(&classpath).arg(entry_name);

        let output = run_bounded(cmd, self.timeout)?;

        if !output.stdout.is_empty() {
            tracing::debug!("{} stdout:\n{}", entry_name, output.stdout);
        }

        if output.timed_out {
            let mut message = format!("execution timed out after {:?}", self.timeout);
            if !output.stderr.is_empty() {
                message.push('\n');
                message.push_str(&output.stderr);
            }
            return Ok(ExecutionResult::failed(message));
        }

        Ok(ExecutionResult {
            success: output.success(),
            error_output: output.stderr,
        })
    }
}
