//! Stack lifecycle: making a saved compose file live.
//!
//! Applying a descriptor stops the running stack and starts it again from
//! the file on disk. The descriptor is never rolled back and nothing is
//! retried; a failed phase is reported to the caller with the tool output.

use crate::error::{ApplyPhase, DcmError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{error, info, instrument};

/// Restarts the stack described by a compose file.
#[async_trait]
pub trait StackApplier: Send + Sync {
    /// Stop the running stack, then start it from the descriptor at `location`.
    async fn apply(&self, location: &Path) -> Result<()>;
}

/// Applier that shells out to the compose CLI.
///
/// Runs `<program> <args..> -f <file> down` followed by
/// `<program> <args..> -f <file> up -d`, both from the descriptor's
/// directory. The start phase only runs once the stop phase succeeded.
#[derive(Debug, Clone)]
pub struct ComposeApplier {
    program: String,
    args: Vec<String>,
}

impl Default for ComposeApplier {
    fn default() -> Self {
        Self { program: "docker".to_string(), args: vec!["compose".to_string()] }
    }
}

impl ComposeApplier {
    /// Build an applier from a command line such as `["docker", "compose"]`
    /// or `["docker-compose"]`. An empty command falls back to the default.
    pub fn new(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, args)) => Self { program: program.clone(), args: args.to_vec() },
            None => Self::default(),
        }
    }

    async fn run(&self, phase: ApplyPhase, dir: &Path, file: &str) -> Result<String> {
        let subcommand: &[&str] = match phase {
            ApplyPhase::Stop => &["down"],
            ApplyPhase::Start => &["up", "-d"],
        };

        info!(phase = %phase, dir = %dir.display(), "Running {} {}", self.program, phase);

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(["-f", file])
            .args(subcommand)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| DcmError::Apply {
                phase,
                output: format!("failed to run {}: {}", self.program, e),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            error!(phase = %phase, status = %output.status, "Compose command failed");
            return Err(DcmError::Apply { phase, output: combined });
        }

        Ok(combined)
    }
}

#[async_trait]
impl StackApplier for ComposeApplier {
    #[instrument(skip(self), fields(location = %location.display()))]
    async fn apply(&self, location: &Path) -> Result<()> {
        let dir = match location.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.to_string_lossy().into_owned());

        self.run(ApplyPhase::Stop, dir, &file).await?;
        self.run(ApplyPhase::Start, dir, &file).await?;

        info!("Stack restarted");
        Ok(())
    }
}
