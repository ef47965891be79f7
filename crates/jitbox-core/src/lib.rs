//! Core engine for the jitbox JIT diagnostics sandbox.
//!
//! This crate provides:
//! - A resettable workspace with seeded example sources
//! - Source unit writing with entry-point detection
//! - Diagnostic runtime flag construction from config
//! - Bounded compiler and runtime invocation
//! - The sandbox pipeline: write, compile, execute, ingest, locate

pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
pub mod locate;
pub mod model;
pub mod options;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod sink;
pub mod source;
pub mod sync;
pub mod toolchain;

pub use compile::{CompilationResult, Compiler, JavacCompiler};
pub use config::{ConfigStore, JsonConfigStore, SandboxConfig, TriState};
pub use error::{Error, Result};
pub use execute::{ExecutionResult, Executor, JavaExecutor};
pub use locate::ResultLocator;
pub use model::{AnalysisModel, EmptyModel, MetaClass, MetaMember};
pub use options::DiagnosticOptions;
pub use paths::{Seed, Workspace, WorkspaceLock};
pub use pipeline::{RunContext, RunOutcome, Sandbox, Stage, Step};
pub use sink::{SandboxSink, TracingSink};
pub use source::{EntryPointDetector, MainSignature, SandboxSession, SourceUnit, SourceUnitWriter};
pub use sync::ConfigSynchronizer;
pub use toolchain::JavaToolchain;
