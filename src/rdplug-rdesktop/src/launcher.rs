//! Spawning the external RDP client.

use rdplug_core::redact::display_argv;
use std::process::{Child, Command};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("empty command line")]
    EmptyCommand,
    #[error("{0}")]
    SpawnFailed(std::io::Error),
}

/// Handle to a client process that runs independently of the session.
///
/// Dropping it neither waits for nor kills the child.
#[derive(Debug)]
pub struct SpawnedClient {
    child: Child,
}

impl SpawnedClient {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking liveness probe.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

/// Fire-and-forget process launcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Start `argv[0]` with the remaining arguments. The program is looked
    /// up on `PATH`, no shell is involved, and stdio is inherited.
    pub fn launch(&self, argv: &[String]) -> Result<SpawnedClient, LaunchError> {
        let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;
        tracing::debug!(command = %display_argv(argv), "starting client");

        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(LaunchError::SpawnFailed)?;

        tracing::info!(program = %program, pid = child.id(), "client started");
        Ok(SpawnedClient { child })
    }
}
