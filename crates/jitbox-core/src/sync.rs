//! Folding the workspace into the persisted config and re-ingesting the log.

use std::path::{Path, PathBuf};

use crate::config::{ConfigStore, SandboxConfig};
use crate::error::Result;
use crate::model::AnalysisModel;
use crate::paths::Workspace;

/// Registers workspace locations in the config, then refreshes the model.
pub struct ConfigSynchronizer<'a> {
    workspace: &'a Workspace,
    source_archive: Option<PathBuf>,
}

impl<'a> ConfigSynchronizer<'a> {
    /// `source_archive` is the runtime's library source archive, if found.
    pub fn new(workspace: &'a Workspace, source_archive: Option<PathBuf>) -> Self {
        Self {
            workspace,
            source_archive,
        }
    }

    /// Add any missing workspace location to `config`.
    ///
    /// Source locations get the source directory and the archive; class
    /// locations get the class directory. Returns whether anything changed.
    pub fn register_paths(&self, config: &mut SandboxConfig) -> bool {
        let mut changed = add_missing(&mut config.source_locations, &self.workspace.source_dir);
        changed |= add_missing(&mut config.class_locations, &self.workspace.class_dir);

        if let Some(archive) = &self.source_archive {
            changed |= add_missing(&mut config.source_locations, archive);
        }

        changed
    }

    /// Register paths, persist if needed, and re-read the session log.
    ///
    /// Returns whether the config was saved.
    pub fn synchronize(
        &self,
        config: &mut SandboxConfig,
        store: &dyn ConfigStore,
        model: &mut dyn AnalysisModel,
    ) -> Result<bool> {
        let changed = self.register_paths(config);
        if changed {
            store.save(config)?;
            tracing::info!("Registered sandbox locations in config");
        }

        model.reset();
        model.ingest(&self.workspace.log_file)?;

        Ok(changed)
    }
}

fn add_missing(locations: &mut Vec<String>, path: &Path) -> bool {
    let entry = path.display().to_string();
    if locations.contains(&entry) {
        return false;
    }
    locations.push(entry);
    true
}
