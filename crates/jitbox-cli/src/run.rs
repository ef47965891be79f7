//! Run command implementation for jitbox CLI.
//!
//! Writes the given sources into the sandbox, compiles and runs them under
//! the JIT diagnostic flags, then re-ingests the diagnostic log.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use jitbox_core::{
    EmptyModel, JavaExecutor, JavaToolchain, JavacCompiler, JsonConfigStore, RunOutcome, Sandbox,
    Workspace,
};

use crate::colors;
use crate::terminal::TerminalSink;

/// Run the sandbox over `files`. Returns whether the run reached the end.
pub fn execute(workspace: &Workspace, config_path: &Path, files: &[PathBuf], quiet: bool) -> anyhow::Result<bool> {
    let start = Instant::now();

    let sources = files
        .iter()
        .map(|f| fs::read_to_string(f).with_context(|| format!("Failed to read {}", f.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let store = JsonConfigStore::new(config_path);
    let mut config = store.load()?;

    let toolchain = JavaToolchain::new()?;
    tracing::debug!(
        "Using javac {} and java {}",
        toolchain.javac_path().display(),
        toolchain.java_path().display()
    );
    let archive = toolchain.source_archive();
    let compiler = JavacCompiler::new(toolchain.clone(), config.compile_timeout());
    let executor = JavaExecutor::new(toolchain, config.execute_timeout());

    let _lock = workspace.lock()?;

    println!(
        "\n{}Sandbox{} {}{}{}",
        colors::CYAN,
        colors::RESET,
        colors::BOLD,
        workspace.sandbox_dir.display(),
        colors::RESET
    );

    let sink = TerminalSink::new(quiet);
    let sandbox = Sandbox::new(workspace, &compiler, &executor, &store, &sink).with_source_archive(archive);

    let mut model = EmptyModel::new();
    let outcome = sandbox.run(&sources, &mut config, &mut model)?;
    let elapsed = start.elapsed().as_secs_f64();

    match outcome {
        RunOutcome::Located(_) => {
            println!(
                "{}Completed{} in {:.2}s ({} bytes of compilation log)",
                colors::GREEN,
                colors::RESET,
                elapsed,
                model.ingested_bytes()
            );
            Ok(true)
        }
        RunOutcome::NoEntryPoint => {
            println!(
                "{}Compiled only:{} no source declares `public static void main(`",
                colors::YELLOW,
                colors::RESET
            );
            Ok(true)
        }
        RunOutcome::CompilationFailed { .. } => {
            eprintln!("{}Compilation failed{}", colors::RED, colors::RESET);
            Ok(false)
        }
        RunOutcome::ExecutionFailed { .. } => {
            eprintln!("{}Execution failed{}", colors::RED, colors::RESET);
            Ok(false)
        }
    }
}
