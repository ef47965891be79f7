//! Where a sandbox run reports to.

use crate::model::MetaMember;

/// Receives progress lines, errors and the final navigation request.
pub trait SandboxSink: Send + Sync {
    /// A progress line.
    fn log(&self, line: &str);

    /// Compiler or runtime output that explains why the run stopped.
    fn show_error(&self, text: &str);

    /// Called once at the end of a located run, with the member to open.
    fn navigate_to(&self, member: Option<&MetaMember>);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl SandboxSink for TracingSink {
    fn log(&self, line: &str) {
        tracing::info!("{}", line);
    }

    fn show_error(&self, text: &str) {
        tracing::error!("{}", text);
    }

    fn navigate_to(&self, member: Option<&MetaMember>) {
        match member {
            Some(m) => tracing::info!("Navigate to {}", m.signature),
            None => tracing::info!("Nothing to navigate to"),
        }
    }
}
