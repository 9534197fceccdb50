//! Build controller.
//!
//! Drives one agent build through a fixed sequence:
//!
//! ```text
//! Start → Loaded → Unpacked → Patched → Scrambled → Melted → Signed → Packed → Done
//!   └──────────────────────────── any failure ───────────────────────────────→ Failed
//! ```
//!
//! Every step runs to completion before the next starts. The first error
//! aborts the build, the workspace is removed, and the error is returned
//! unchanged. Nothing is retried.

pub mod context;

pub use context::BuildContext;

use std::path::{Component, Path, PathBuf};

use crate::builder::{Builder, Registry, Stage};
use crate::error::{BuildError, Result};
use crate::extract::extract_archive;
use crate::loader;
use crate::store::Services;
use crate::timing::Timer;
use crate::workspace::Workspace;

/// Parameters of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Selects both the template and the builder.
    pub platform: String,
    /// Factory (deployment record) identifier.
    pub factory: String,
    /// Name of the core file inside the template archive.
    pub core: String,
    /// Name of the config file to emit.
    pub config: String,
    /// Demo builds keep the demo marker.
    pub demo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Start,
    Loaded,
    Unpacked,
    Patched,
    Scrambled,
    Melted,
    Signed,
    Packed,
    Done,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }

    /// State reached once `stage` completes.
    fn after(stage: Stage) -> Self {
        match stage {
            Stage::Patch => BuildState::Patched,
            Stage::Scramble => BuildState::Scrambled,
            Stage::Melt => BuildState::Melted,
            Stage::Sign => BuildState::Signed,
            Stage::Pack => BuildState::Packed,
        }
    }
}

/// Result of a successful build.
///
/// The workspace is kept on disk; call [`BuildOutput::release`] once the
/// outputs have been consumed.
#[derive(Debug)]
pub struct BuildOutput {
    workspace: Workspace,
    pub platform: String,
    pub version: String,
    pub outputs: Vec<String>,
}

impl BuildOutput {
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Absolute paths of the outputs.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.outputs.iter().map(|o| self.workspace.join(o)).collect()
    }

    /// Every file currently in the workspace.
    pub fn files(&self) -> Vec<String> {
        self.workspace.files()
    }

    /// Remove the workspace.
    pub fn release(mut self) {
        self.workspace.release();
    }
}

/// One build attempt.
pub struct Build<'a> {
    request: BuildRequest,
    services: Services<'a>,
    work_root: PathBuf,
    state: BuildState,
    history: Vec<BuildState>,
}

impl<'a> Build<'a> {
    /// `work_root` is the parent of the workspace and of the template copy.
    pub fn new(request: BuildRequest, services: Services<'a>, work_root: &Path) -> Self {
        Self {
            request,
            services,
            work_root: work_root.to_path_buf(),
            state: BuildState::Start,
            history: vec![BuildState::Start],
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Every state visited so far, starting with `Start`.
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    fn advance(&mut self, next: BuildState) {
        tracing::debug!("Build: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    /// Run the build using the builder registered for the request's platform.
    pub fn run(&mut self, registry: &Registry) -> Result<BuildOutput> {
        self.ensure_fresh()?;
        let result = registry
            .resolve(&self.request.platform)
            .and_then(|mut builder| self.drive(builder.as_mut()));
        self.settle(result)
    }

    /// Run the build with an explicit builder.
    pub fn run_with(&mut self, builder: &mut dyn Builder) -> Result<BuildOutput> {
        self.ensure_fresh()?;
        let result = self.drive(builder);
        self.settle(result)
    }

    fn ensure_fresh(&self) -> Result<()> {
        if self.state != BuildState::Start {
            return Err(BuildError::stage(
                "start",
                format!("build already ran (state {:?})", self.state),
            ));
        }
        Ok(())
    }

    fn settle(&mut self, result: Result<BuildOutput>) -> Result<BuildOutput> {
        match result {
            Ok(output) => {
                self.advance(BuildState::Done);
                Ok(output)
            }
            Err(e) => {
                tracing::error!("Cannot build: {}", e);
                self.advance(BuildState::Failed);
                Err(e)
            }
        }
    }

    // The workspace is dropped (and removed) on every early return below.
    fn drive(&mut self, builder: &mut dyn Builder) -> Result<BuildOutput> {
        tracing::debug!("Building Agent: {:?}", self.request);
        ensure_relative(&self.request.core)?;
        ensure_relative(&self.request.config)?;

        let services = self.services;
        let platform = builder.platform();

        // Same key the registry resolved the builder with.
        let template_key = self.request.platform.to_ascii_lowercase();
        let (core, factory) = loader::load(
            &services,
            &template_key,
            &self.request.factory,
            &self.work_root,
        )?;
        let version = core.version.clone();
        self.advance(BuildState::Loaded);

        let workspace = Workspace::allocate(&self.work_root)?;
        tracing::debug!("Build: unpack: {}", core.path().display());
        let outputs = extract_archive(core.open()?, workspace.path())?;
        core.close()?;
        self.advance(BuildState::Unpacked);

        let mut ctx = BuildContext::new(platform, workspace.path(), &self.request, factory, outputs);

        for stage in Stage::ORDER {
            let timer = Timer::start(stage, workspace.path());
            match stage {
                Stage::Patch => builder.patch(&mut ctx, &services)?,
                Stage::Scramble => builder.scramble(&mut ctx)?,
                Stage::Melt => builder.melt(&mut ctx)?,
                Stage::Sign => builder.sign(&mut ctx)?,
                Stage::Pack => builder.pack(&mut ctx)?,
            }
            timer.finish();
            self.advance(BuildState::after(stage));
        }

        Ok(BuildOutput {
            workspace: workspace.persist()?,
            platform: ctx.platform,
            version,
            outputs: ctx.outputs,
        })
    }
}

/// Core and config names must be plain relative paths inside the workspace.
fn ensure_relative(name: &str) -> Result<()> {
    let path = Path::new(name);
    let plain = path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(BuildError::UnsafeFileName(name.to_string()))
    }
}

/// Build an agent with the process-wide builder registry.
pub fn create(request: BuildRequest, services: Services<'_>, work_root: &Path) -> Result<BuildOutput> {
    Build::new(request, services, work_root).run(crate::builder::registry())
}
