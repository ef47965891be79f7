//! Contract with the analysis model built from the diagnostic log.
//!
//! Parsing the log is the model's business; the sandbox only resets it,
//! points it at a log file and looks classes up by name afterwards.

use std::path::Path;

use crate::error::Result;

/// A method or constructor of an analysed class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaMember {
    /// Human-readable signature, e.g. `public void run()`.
    pub signature: String,
    compiled: bool,
}

impl MetaMember {
    pub fn new(signature: impl Into<String>, compiled: bool) -> Self {
        Self {
            signature: signature.into(),
            compiled,
        }
    }

    /// Whether the runtime compiled this member during the run.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }
}

/// A class as the analysis model sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaClass {
    pub fully_qualified_name: String,
    members: Vec<MetaMember>,
}

impl MetaClass {
    pub fn new(fully_qualified_name: impl Into<String>, members: Vec<MetaMember>) -> Self {
        Self {
            fully_qualified_name: fully_qualified_name.into(),
            members,
        }
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MetaMember] {
        &self.members
    }
}

/// The queryable model populated from a diagnostic log.
pub trait AnalysisModel {
    /// Forget everything ingested so far.
    fn reset(&mut self);

    /// Read the diagnostic log at `log_file`.
    ///
    /// Model-specific failures should surface as
    /// [`Error::Analysis`](crate::Error::Analysis).
    fn ingest(&mut self, log_file: &Path) -> Result<()>;

    fn lookup(&self, fully_qualified_name: &str) -> Option<&MetaClass>;
}

/// A model that checks the log is readable and knows no classes.
///
/// Used where no log parser is wired in; every lookup misses.
#[derive(Debug, Default)]
pub struct EmptyModel {
    ingested_bytes: u64,
}

impl EmptyModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the last ingested log.
    pub fn ingested_bytes(&self) -> u64 {
        self.ingested_bytes
    }
}

impl AnalysisModel for EmptyModel {
    fn reset(&mut self) {
        self.ingested_bytes = 0;
    }

    fn ingest(&mut self, log_file: &Path) -> Result<()> {
        let meta = std::fs::metadata(log_file).map_err(|e| crate::Error::filesystem(log_file, e))?;
        self.ingested_bytes = meta.len();
        tracing::debug!("Ingested {} bytes from {}", meta.len(), log_file.display());
        Ok(())
    }

    fn lookup(&self, _fully_qualified_name: &str) -> Option<&MetaClass> {
        None
    }
}
