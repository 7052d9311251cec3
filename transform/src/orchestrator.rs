//! Runs fingerprinting and generation for one request and persists the result.
//!
//! Each compilation gets a private scoped workspace that is removed when the
//! call returns, errors, panics, or (for the async entry point) is dropped.
//! The shared output directory is the only state visible across requests;
//! artifact names carry a fresh random suffix so concurrent writers never
//! target the same path.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::Builder as TempFileBuilder;
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::codegen::GeneratedModule;
use crate::codegen::generate_from_source;
use crate::config::TransformConfig;

const WORKSPACE_PREFIX: &str = ".zkcode-workspace-";
const ARTIFACT_TEMP_PREFIX: &str = ".zkcode_artifact_";
const SOURCE_EXTENSION: &str = ".c";
const SUFFIX_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
    #[error("failed to create scoped workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("failed to write {}: {source}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to persist artifact {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("compile task failed: {0}")]
    Join(String),
}

/// A module together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifact {
    pub module: GeneratedModule,
    /// `<base>_<suffix>.<extension>`, unique per call.
    pub file_name: String,
    pub directory: PathBuf,
}

impl PersistedArtifact {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactOrchestrator {
    output_dir: PathBuf,
    module_extension: String,
    workspace_dir: Option<PathBuf>,
}

impl ArtifactOrchestrator {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            module_extension: config.module_extension.clone(),
            workspace_dir: config.workspace_dir.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fingerprint `source` exactly as given, render its module, and persist it.
    ///
    /// Normalization is a separate entry point; callers who want it run it first.
    pub fn compile(&self, source: &str, name: &str) -> Result<PersistedArtifact, CompileError> {
        let base = artifact_base_name(name)?;
        let module = generate_from_source(source);
        let file_name = format!("{base}_{}.{}", unique_suffix(), self.module_extension);

        let workspace = self.create_workspace()?;
        stage_module(workspace.path(), &file_name, &module)?;

        std::fs::create_dir_all(&self.output_dir).map_err(|source| CompileError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        let target = self.output_dir.join(&file_name);
        write_atomic_noclobber(&self.output_dir, &target, module.text.as_bytes())?;

        info!(
            artifact = %file_name,
            bytes = module.size,
            id = %module.id,
            "persisted module"
        );
        Ok(PersistedArtifact {
            module,
            file_name,
            directory: self.output_dir.clone(),
        })
    }

    /// [`compile`](Self::compile) on the blocking pool.
    pub async fn compile_async(
        &self,
        source: String,
        name: String,
    ) -> Result<PersistedArtifact, CompileError> {
        let orchestrator = self.clone();
        tokio::task::spawn_blocking(move || orchestrator.compile(&source, &name))
            .await
            .map_err(|err| CompileError::Join(err.to_string()))?
    }

    fn create_workspace(&self) -> Result<TempDir, CompileError> {
        let mut builder = TempFileBuilder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let workspace = match &self.workspace_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(CompileError::Workspace)?;
        debug!(path = %workspace.path().display(), "created scoped workspace");
        Ok(workspace)
    }
}

/// Strip a trailing `.c` and reject anything that could leave the output directory.
fn artifact_base_name(name: &str) -> Result<&str, CompileError> {
    let base = name.strip_suffix(SOURCE_EXTENSION).unwrap_or(name);
    if base.is_empty() || base == "." || base == ".." || base.contains(['/', '\\']) {
        return Err(CompileError::InvalidName(name.to_string()));
    }
    Ok(base)
}

fn unique_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

fn stage_module(
    workspace: &Path,
    file_name: &str,
    module: &GeneratedModule,
) -> Result<(), CompileError> {
    let path = workspace.join(file_name);
    std::fs::write(&path, &module.text).map_err(|source| CompileError::Stage { path, source })
}

fn write_atomic_noclobber(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), CompileError> {
    let persist_error = |source| CompileError::Persist {
        path: target.to_path_buf(),
        source,
    };
    let mut temp = TempFileBuilder::new()
        .prefix(ARTIFACT_TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(persist_error)?;
    temp.as_file_mut().write_all(bytes).map_err(persist_error)?;
    temp.as_file_mut().sync_all().map_err(persist_error)?;
    temp.persist_noclobber(target)
        .map_err(|err| persist_error(err.error))?;
    Ok(())
}
