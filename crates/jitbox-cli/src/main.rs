//! jitbox CLI - Write, compile and run Java snippets under JIT diagnostics.

mod colors;
mod run;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jitbox_core::{DiagnosticOptions, JsonConfigStore, Seed, Workspace};

const CONFIG_FILE: &str = "jitbox.json";

#[derive(Parser)]
#[command(name = "jitbox")]
#[command(about = "Sandbox for watching the JIT compile small Java programs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the sandbox (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: <root>/jitbox.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed a fresh source directory from this directory instead of the bundled examples
    #[arg(long, global = true)]
    seed: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run Java sources, then locate the first JIT-compiled member
    Run {
        /// Java source files; the last one with a main method is executed
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Hide per-stage progress lines
        #[arg(short, long)]
        quiet: bool,
    },

    /// Empty the sandbox and re-seed the example sources
    Reset,

    /// Print the diagnostic VM options the current config yields
    Options,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format jitbox-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(jitbox_err) = err.downcast_ref::<jitbox_core::Error>() {
            anyhow::anyhow!("{}", jitbox_err.with_hint())
        } else {
            err
        }
    };

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let config_path = cli.config.unwrap_or_else(|| root.join(CONFIG_FILE));
    let seed = cli.seed.map_or(Seed::Bundled, Seed::Directory);
    let workspace = Workspace::new(&root).map_err(anyhow::Error::from).map_err(format_error)?.with_seed(seed);

    match cli.command {
        Commands::Run { files, quiet } => {
            let completed = run::execute(&workspace, &config_path, &files, quiet).map_err(format_error)?;
            if !completed {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Reset => {
            reset(&workspace).map_err(format_error)?;
        }

        Commands::Options => {
            print_options(&workspace, &config_path).map_err(format_error)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn reset(workspace: &Workspace) -> anyhow::Result<()> {
    let _lock = workspace.lock()?;
    workspace.reset()?;

    println!(
        "{}Reset{} {}",
        colors::GREEN,
        colors::RESET,
        workspace.source_dir.display()
    );
    Ok(())
}

fn print_options(workspace: &Workspace, config_path: &std::path::Path) -> anyhow::Result<()> {
    let config = JsonConfigStore::new(config_path).load()?;
    for flag in DiagnosticOptions::build(&config, &workspace.log_file).into_vec() {
        println!("{flag}");
    }
    Ok(())
}
