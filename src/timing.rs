//! Per-stage timing for build logs.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::builder::Stage;

/// Measures one pipeline stage of one build.
pub struct Timer {
    stage: Stage,
    workspace: PathBuf,
    start: Instant,
}

impl Timer {
    pub fn start(stage: Stage, workspace: &Path) -> Self {
        tracing::debug!("Build: {} started in {}", stage, workspace.display());
        Self {
            stage,
            workspace: workspace.to_path_buf(),
            start: Instant::now(),
        }
    }

    /// Log the stage duration and return it.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        tracing::info!(
            stage = self.stage.name(),
            workspace = %self.workspace.display(),
            "Build: {} done in {:.2}s",
            self.stage,
            elapsed.as_secs_f64()
        );
        elapsed
    }
}
