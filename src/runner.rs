//! # Transform Runner
//!
//! Runs the bound optimizers against one file and reports its new size.
//!
//! The chain runs on a staged copy beside the upload. The copy replaces the
//! upload only when the whole chain succeeded and the result is non-empty and
//! not larger, so a failed chain leaves the stored file byte-for-byte intact.
//!
//! The file's actual kind is sniffed from its content, never taken from the
//! declared content type. Failures are returned as [`OptimizeError`] so the
//! dispatcher can decide what to do with them; stat failures after a
//! successful run are reported as [`OptimizeError::StatFailed`].

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use crate::binder::StagedOutput;
use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use crate::registry::OptimizerHandle;

/// Transforms a file in place, returning its size afterwards.
#[async_trait]
pub trait TransformRunner: Send + Sync {
    async fn optimize(&self, handle: &OptimizerHandle, path: &Path) -> Result<u64, OptimizeError>;
}

/// Default runner: sniff, run the binder chain, stat.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolRunner;

#[async_trait]
impl TransformRunner for ToolRunner {
    async fn optimize(&self, handle: &OptimizerHandle, path: &Path) -> Result<u64, OptimizeError> {
        let kind = FileManager::sniff_kind(path)
            .await?
            .ok_or_else(|| OptimizeError::UnsupportedFormat(path.display().to_string()))?;

        if handle.binders_for(kind).is_empty() {
            return Err(OptimizeError::ToolUnavailable(kind.to_string()));
        }

        // The chain works on a copy; the upload is only touched on success
        let start_time = Instant::now();
        let staged = StagedOutput::copy_of(path).await?;
        handle.optimize(staged.path(), kind).await?;

        stat(staged.path()).await?;
        let replaced = staged.commit(path).await?;
        let size = stat(path).await?;

        debug!(
            "{} {} optimized in {:?}, now {} (replaced: {})",
            kind,
            path.display(),
            start_time.elapsed(),
            FileManager::format_size(size),
            replaced
        );
        Ok(size)
    }
}

async fn stat(path: &Path) -> Result<u64, OptimizeError> {
    FileManager::file_size(path)
        .await
        .map_err(|source| OptimizeError::StatFailed {
            path: path.to_path_buf(),
            source,
        })
}
