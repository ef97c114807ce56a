//! # Binder Module
//!
//! Un `Binder` è il collegamento tra un nome logico di tool e un optimizer
//! esterno invocabile.
//!
//! ## Responsabilità:
//! - Definisce il trait `Binder` implementato da ogni tool supportato
//! - `ToolCommand`: esecuzione di un processo esterno con timeout
//! - `StagedOutput`: file temporaneo accanto all'upload per i tool che
//!   scrivono su un file di output separato (jpegtran, pngquant)
//! - `builtin()`: costruisce il binder di default per un `Tool`
//!
//! ## Tool per formato:
//! - **PNG**: pngquant, optipng, pngcrush, pngout, advpng
//! - **JPEG**: jpegoptim, jpegtran
//! - **GIF**: gifsicle
//! - **SVG**: svgo
//!
//! Nuovi tool si aggiungono implementando `Binder` e registrandoli con
//! `OptimizerRegistry::with_binder`.

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod svg;

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::error::OptimizeError;
use crate::tool::{ImageKind, Tool};

/// A resolved, invocable optimizer for one image kind.
#[async_trait]
pub trait Binder: Send + Sync + Debug {
    /// Name used in logs and error reports
    fn name(&self) -> &str;

    /// Image kind this binder optimizes
    fn kind(&self) -> ImageKind;

    /// Optimize the file at `path` in place.
    async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError>;
}

/// Build the default binder for a known tool
pub fn builtin(tool: Tool, program: PathBuf, options: Vec<String>) -> Arc<dyn Binder> {
    let command = ToolCommand::new(tool.name(), program, options);
    match tool {
        Tool::Advpng => Arc::new(png::Advpng::new(command)),
        Tool::Gifsicle => Arc::new(gif::Gifsicle::new(command)),
        Tool::Jpegoptim => Arc::new(jpeg::Jpegoptim::new(command)),
        Tool::Jpegtran => Arc::new(jpeg::Jpegtran::new(command)),
        Tool::Optipng => Arc::new(png::Optipng::new(command)),
        Tool::Pngcrush => Arc::new(png::Pngcrush::new(command)),
        Tool::Pngout => Arc::new(png::Pngout::new(command)),
        Tool::Pngquant => Arc::new(png::Pngquant::new(command)),
        Tool::Svgo => Arc::new(svg::Svgo::new(command)),
    }
}

/// Render a path as a positional argument that cannot be read as a flag
pub fn path_arg(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if rendered.starts_with('-') {
        format!(".{}{}", std::path::MAIN_SEPARATOR, rendered)
    } else {
        rendered.into_owned()
    }
}

/// External program plus its configured flags.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    name: String,
    program: PathBuf,
    options: Vec<String>,
}

impl ToolCommand {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured flags, placed before positional arguments
    pub fn options(&self) -> &[String] {
        &self.options
    }

    fn failure(&self, reason: impl Into<String>) -> OptimizeError {
        OptimizeError::ToolExecutionFailed {
            tool: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Run the program with `args`, killing it if it outlives `timeout`.
    pub async fn run(&self, args: &[String], timeout: Duration) -> Result<(), OptimizeError> {
        self.run_accepting(args, timeout, &[]).await
    }

    /// Like [`run`](Self::run), also treating the listed exit codes as success.
    pub async fn run_accepting(
        &self,
        args: &[String],
        timeout: Duration,
        accepted_codes: &[i32],
    ) -> Result<(), OptimizeError> {
        debug!("Running {}: {:?} {:?}", self.name, self.program, args);

        let start_time = Instant::now();
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.failure(format!("failed to start {}: {}", self.program.display(), e))
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| self.failure(e.to_string()))?,
            Err(_) => return Err(self.failure(format!("timed out after {:?}", timeout))),
        };
        let elapsed = start_time.elapsed();

        if output.status.success() {
            debug!("{} completed successfully in {:?}", self.name, elapsed);
            Ok(())
        } else if output
            .status
            .code()
            .map(|code| accepted_codes.contains(&code))
            .unwrap_or(false)
        {
            debug!("{} left the file unchanged ({})", self.name, output.status);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(self.failure(format!("{} after {:?}: {}", output.status, elapsed, stderr.trim())))
        }
    }
}

/// Temporary output file created next to the upload it will replace.
///
/// The file is removed when dropped.
#[derive(Debug)]
pub struct StagedOutput {
    file: NamedTempFile,
}

impl StagedOutput {
    pub fn beside(target: &Path) -> Result<Self, OptimizeError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Keep the target extension
        let suffix = target
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let file = tempfile::Builder::new()
            .prefix(".upload-optimizer-")
            .suffix(&suffix)
            .tempfile_in(dir)?;

        Ok(Self { file })
    }

    /// Staged copy of `target`, for running a whole tool chain off the upload
    pub async fn copy_of(target: &Path) -> Result<Self, OptimizeError> {
        let staged = Self::beside(target)?;
        tokio::fs::copy(target, staged.path()).await?;
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Copy the staged result over `target` if it is non-empty and not larger.
    ///
    /// Copying keeps the target's inode and permissions intact. Returns
    /// whether the target was replaced.
    pub async fn commit(self, target: &Path) -> Result<bool, OptimizeError> {
        let staged_size = tokio::fs::metadata(self.path()).await?.len();
        let original_size = tokio::fs::metadata(target).await?.len();

        if staged_size == 0 || staged_size > original_size {
            debug!(
                "Discarding staged output for {} ({} -> {} bytes)",
                target.display(),
                original_size,
                staged_size
            );
            return Ok(false);
        }

        tokio::fs::copy(self.path(), target).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_arg_guards_leading_dash() {
        assert_eq!(path_arg(Path::new("/tmp/a.png")), "/tmp/a.png");
        assert_eq!(
            path_arg(Path::new("-rf.png")),
            format!(".{}-rf.png", std::path::MAIN_SEPARATOR)
        );
    }

    #[test]
    fn test_builtin_kinds() {
        for tool in Tool::ALL {
            let binder = builtin(tool, PathBuf::from(tool.name()), Vec::new());
            assert_eq!(binder.name(), tool.name());
            assert_eq!(binder.kind(), tool.kind());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tool_command_success_and_failure() {
        let ok = ToolCommand::new("sh", "sh", Vec::new());
        ok.run(&crate::args!["-c", "exit 0"], Duration::from_secs(10))
            .await
            .unwrap();

        let err = ok
            .run(&crate::args!["-c", "echo broken >&2; exit 3"], Duration::from_secs(10))
            .await
            .unwrap_err();
        match err {
            OptimizeError::ToolExecutionFailed { tool, reason } => {
                assert_eq!(tool, "sh");
                assert!(reason.contains("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tool_command_accepted_exit_code() {
        let cmd = ToolCommand::new("pngout", "sh", Vec::new());
        cmd.run_accepting(&crate::args!["-c", "exit 2"], Duration::from_secs(10), &[2])
            .await
            .unwrap();
        assert!(cmd
            .run_accepting(&crate::args!["-c", "exit 1"], Duration::from_secs(10), &[2])
            .await
            .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tool_command_timeout() {
        let slow = ToolCommand::new("sleeper", "sh", Vec::new());
        let start = Instant::now();
        let err = slow
            .run(&crate::args!["-c", "sleep 5"], Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_tool_command_missing_binary() {
        let missing = ToolCommand::new("ghost", "/nonexistent/bin/ghost-optimizer", Vec::new());
        let err = missing.run(&[], Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, OptimizeError::ToolExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_staged_output_commit_rules() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("upload.png");
        tokio::fs::write(&target, vec![1u8; 100]).await.unwrap();

        // Larger output is discarded
        let staged = StagedOutput::beside(&target).unwrap();
        assert!(staged.path().to_string_lossy().ends_with(".png"));
        tokio::fs::write(staged.path(), vec![2u8; 150]).await.unwrap();
        assert!(!staged.commit(&target).await.unwrap());
        assert_eq!(tokio::fs::metadata(&target).await.unwrap().len(), 100);

        // Empty output is discarded
        let staged = StagedOutput::beside(&target).unwrap();
        assert!(!staged.commit(&target).await.unwrap());

        // Smaller output replaces the target
        let staged = StagedOutput::beside(&target).unwrap();
        let staged_path = staged.path().to_path_buf();
        tokio::fs::write(&staged_path, vec![3u8; 40]).await.unwrap();
        assert!(staged.commit(&target).await.unwrap());
        assert_eq!(tokio::fs::metadata(&target).await.unwrap().len(), 40);
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_staged_copy_leaves_target_alone() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("upload.gif");
        tokio::fs::write(&target, b"GIF89a-original").await.unwrap();

        let staged = StagedOutput::copy_of(&target).await.unwrap();
        assert_eq!(tokio::fs::read(staged.path()).await.unwrap(), b"GIF89a-original");

        tokio::fs::write(staged.path(), b"GIF89a").await.unwrap();
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"GIF89a-original");

        let staged_path = staged.path().to_path_buf();
        drop(staged);
        assert!(!staged_path.exists());
    }
}
