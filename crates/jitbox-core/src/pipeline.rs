//! The sandbox run: write, compile, execute, ingest, locate.
//!
//! A run is a small state machine. Each [`Stage`] either advances to the
//! next one or stops with a [`RunOutcome`]:
//!
//! ```text
//! Writing ─► Compiling ─┬─► Executing ─┬─► Ingesting ─► Locating ─► Done
//!                       │              └─► Aborted (execution failure)
//!                       ├─► NoEntryPoint
//!                       └─► Aborted (compilation failure)
//! ```
//!
//! Hard errors (filesystem, unparseable source, missing toolchain, model
//! failures) end the run through `Err` from any stage.

use std::fmt;
use std::path::PathBuf;

use crate::compile::Compiler;
use crate::config::{ConfigStore, SandboxConfig};
use crate::error::{Error, Result};
use crate::execute::Executor;
use crate::locate::ResultLocator;
use crate::model::{AnalysisModel, MetaMember};
use crate::options::DiagnosticOptions;
use crate::paths::Workspace;
use crate::sink::SandboxSink;
use crate::source::{EntryPointDetector, MainSignature, SandboxSession, SourceUnitWriter};
use crate::sync::ConfigSynchronizer;

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Writing,
    Compiling,
    Executing,
    NoEntryPoint,
    Ingesting,
    Locating,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a run that did not hit a hard error ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage ran; carries the member handed to the sink, if any.
    Located(Option<MetaMember>),

    /// Compiled, but no unit has an entry point to run.
    NoEntryPoint,

    /// The compiler rejected the sources.
    CompilationFailed { messages: String },

    /// The program failed, crashed or timed out.
    ExecutionFailed { error_output: String },
}

impl RunOutcome {
    /// The terminal stage this outcome corresponds to.
    pub fn final_stage(&self) -> Stage {
        match self {
            Self::Located(_) => Stage::Done,
            Self::NoEntryPoint => Stage::NoEntryPoint,
            Self::CompilationFailed { .. } | Self::ExecutionFailed { .. } => Stage::Aborted,
        }
    }
}

/// Result of running one stage.
#[derive(Debug)]
pub enum Step {
    Advance(Stage),
    Stop(RunOutcome),
}

/// Mutable state threaded through the stages of one run.
pub struct RunContext<'r> {
    pub sources: &'r [String],
    pub session: SandboxSession,
    pub config: &'r mut SandboxConfig,
    pub model: &'r mut dyn AnalysisModel,
}

impl<'r> RunContext<'r> {
    pub fn new(
        sources: &'r [String],
        config: &'r mut SandboxConfig,
        model: &'r mut dyn AnalysisModel,
    ) -> Self {
        Self {
            sources,
            session: SandboxSession::new(),
            config,
            model,
        }
    }
}

/// Drives sandbox runs against one workspace.
///
/// Runs are sequential; callers that may start runs concurrently should
/// hold [`Workspace::lock`] around [`run`](Self::run).
pub struct Sandbox<'a> {
    workspace: &'a Workspace,
    compiler: &'a dyn Compiler,
    executor: &'a dyn Executor,
    store: &'a dyn ConfigStore,
    sink: &'a dyn SandboxSink,
    detector: Box<dyn EntryPointDetector>,
    source_archive: Option<PathBuf>,
}

impl<'a> Sandbox<'a> {
    pub fn new(
        workspace: &'a Workspace,
        compiler: &'a dyn Compiler,
        executor: &'a dyn Executor,
        store: &'a dyn ConfigStore,
        sink: &'a dyn SandboxSink,
    ) -> Self {
        Self {
            workspace,
            compiler,
            executor,
            store,
            sink,
            detector: Box::new(MainSignature),
            source_archive: None,
        }
    }

    /// Replace the entry-point heuristic.
    pub fn with_detector(mut self, detector: impl EntryPointDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Runtime source archive to register alongside the workspace sources.
    pub fn with_source_archive(mut self, archive: Option<PathBuf>) -> Self {
        self.source_archive = archive;
        self
    }

    /// Run every stage for `sources`, in order.
    pub fn run(
        &self,
        sources: &[String],
        config: &mut SandboxConfig,
        model: &mut dyn AnalysisModel,
    ) -> Result<RunOutcome> {
        self.workspace.ensure_ready()?;

        let mut ctx = RunContext::new(sources, config, model);
        let mut stage = Stage::Writing;

        loop {
            match self.step(stage, &mut ctx)? {
                Step::Advance(next) => {
                    tracing::debug!("{} -> {}", stage, next);
                    stage = next;
                }
                Step::Stop(outcome) => {
                    tracing::info!("Sandbox run finished at {}", outcome.final_stage());
                    return Ok(outcome);
                }
            }
        }
    }

    /// Run a single stage.
    pub fn step(&self, stage: Stage, ctx: &mut RunContext<'_>) -> Result<Step> {
        match stage {
            Stage::Writing => self.write_sources(ctx),
            Stage::Compiling => self.compile(ctx),
            Stage::NoEntryPoint => {
                self.sink.log("No main method found");
                Ok(Step::Stop(RunOutcome::NoEntryPoint))
            }
            Stage::Executing => self.execute(ctx),
            Stage::Ingesting => self.ingest(ctx),
            Stage::Locating => Ok(Step::Stop(self.locate(ctx))),
            Stage::Done | Stage::Aborted => Err(Error::InvalidOperation(format!(
                "stage {stage} is terminal"
            ))),
        }
    }

    fn write_sources(&self, ctx: &mut RunContext<'_>) -> Result<Step> {
        let writer = SourceUnitWriter::new(&self.workspace.source_dir, self.detector.as_ref());

        for text in ctx.sources {
            let unit = writer.write(text)?;
            let fqn = unit.fully_qualified_name();

            if unit.has_entry_point() {
                self.sink.log(&format!("Found main method in {fqn}"));
            }
            self.sink.log(&format!("Writing source file: {fqn}.java"));

            ctx.session.record(unit);
        }

        Ok(Step::Advance(Stage::Compiling))
    }

    fn compile(&self, ctx: &mut RunContext<'_>) -> Result<Step> {
        let files = ctx.session.files();
        let listing: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        self.sink.log(&format!("Compiling: {}", listing.join(", ")));

        let result = self.compiler.compile(&files, &self.workspace.class_dir)?;
        self.sink.log(&format!("Compilation success: {}", result.success));

        if !result.success {
            self.sink.show_error(&result.messages);
            return Ok(Step::Stop(RunOutcome::CompilationFailed {
                messages: result.messages,
            }));
        }

        if ctx.session.entry_unit_name().is_some() {
            Ok(Step::Advance(Stage::Executing))
        } else {
            Ok(Step::Advance(Stage::NoEntryPoint))
        }
    }

    fn execute(&self, ctx: &mut RunContext<'_>) -> Result<Step> {
        let Some(entry) = ctx.session.entry_unit_name().map(str::to_string) else {
            return Ok(Step::Advance(Stage::NoEntryPoint));
        };

        let class_dir = self.workspace.class_dir.display().to_string();
        let mut classpath = vec![class_dir.clone()];
        classpath.extend(
            ctx.config
                .class_locations
                .iter()
                .filter(|loc| **loc != class_dir)
                .cloned(),
        );

        let options = DiagnosticOptions::build(ctx.config, &self.workspace.log_file);

        self.sink.log(&format!("Executing: {entry}"));
        let joined = std::env::join_paths(&classpath)
            .map_err(|e| Error::Toolchain(format!("invalid classpath entry: {e}")))?;
        self.sink.log(&format!("Classpath: {}", joined.to_string_lossy()));
        self.sink.log(&format!("VM options: {options}"));

        // A log left by an earlier run must not be mistaken for this one's
        if self.workspace.log_file.exists() {
            std::fs::remove_file(&self.workspace.log_file)
                .map_err(|e| Error::filesystem(&self.workspace.log_file, e))?;
        }

        let result = self.executor.execute(&entry, &classpath, options.as_slice())?;
        self.sink.log(&format!("Execution success: {}", result.success));

        if !result.success {
            self.sink.show_error(&result.error_output);
            return Ok(Step::Stop(RunOutcome::ExecutionFailed {
                error_output: result.error_output,
            }));
        }

        Ok(Step::Advance(Stage::Ingesting))
    }

    fn ingest(&self, ctx: &mut RunContext<'_>) -> Result<Step> {
        let synchronizer = ConfigSynchronizer::new(self.workspace, self.source_archive.clone());
        synchronizer.synchronize(ctx.config, self.store, ctx.model)?;
        self.sink.log("Parsing complete");
        Ok(Step::Advance(Stage::Locating))
    }

    fn locate(&self, ctx: &mut RunContext<'_>) -> RunOutcome {
        let locator = ResultLocator::new(&*ctx.model, self.sink);
        let found = match ctx.session.first_unit_name() {
            Some(name) => locator.locate(name),
            None => {
                self.sink.navigate_to(None);
                None
            }
        };
        RunOutcome::Located(found)
    }
}
