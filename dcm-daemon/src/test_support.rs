//! Shared fixtures for daemon tests.

use crate::orchestrator::ComposeOrchestrator;
use dcm_core::{ApplyPhase, ComposeCodec, ComposeFile, Config, DcmError, Result, StackApplier};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Mock applier that records every location it was asked to apply.
#[derive(Default)]
pub struct MockApplier {
    calls: Mutex<Vec<PathBuf>>,
    fail_in: Option<ApplyPhase>,
}

impl MockApplier {
    pub fn failing(phase: ApplyPhase) -> Self {
        Self { calls: Mutex::new(Vec::new()), fail_in: Some(phase) }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StackApplier for MockApplier {
    async fn apply(&self, location: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(location.to_path_buf());
        match self.fail_in {
            Some(phase) => Err(DcmError::Apply { phase, output: "mock failure".to_string() }),
            None => Ok(()),
        }
    }
}

/// A compose file in a temporary directory.
pub struct StackFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl StackFixture {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docker-compose.yml");
        std::fs::write(&path, content).unwrap();
        Self { _dir: dir, path }
    }

    pub fn config(&self) -> Config {
        Config { docker_path: self.path.clone(), ..Default::default() }
    }

    pub fn orchestrator(&self, applier: Arc<dyn StackApplier>) -> ComposeOrchestrator {
        ComposeOrchestrator::new(&self.config(), applier)
    }

    pub fn load(&self) -> ComposeFile {
        ComposeCodec::load(&self.path).unwrap()
    }
}
