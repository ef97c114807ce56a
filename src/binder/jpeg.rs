//! JPEG binders: jpegoptim (in place) and jpegtran (staged output).

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{path_arg, Binder, StagedOutput, ToolCommand};
use crate::error::OptimizeError;
use crate::tool::ImageKind;
use crate::utils::with_trailing;

/// jpegoptim rewrites the file in place; quality and metadata handling come
/// entirely from the configured flags.
#[derive(Debug)]
pub struct Jpegoptim {
    command: ToolCommand,
}

impl Jpegoptim {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command_args(&self, path: &Path) -> Vec<String> {
        with_trailing(self.command.options(), &[path_arg(path)])
    }
}

#[async_trait]
impl Binder for Jpegoptim {
    fn name(&self) -> &str {
        self.command.name()
    }

    fn kind(&self) -> ImageKind {
        ImageKind::Jpeg
    }

    async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError> {
        self.command.run(&self.command_args(path), timeout).await
    }
}

/// jpegtran lossless optimization. Writes to a staged file that replaces the
/// upload only when smaller.
#[derive(Debug)]
pub struct Jpegtran {
    command: ToolCommand,
}

impl Jpegtran {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command_args(&self, path: &Path, output: &Path) -> Vec<String> {
        let mut args = crate::args!["-optimize", "-progressive"];
        args.extend(with_trailing(
            self.command.options(),
            &["-outfile".to_string(), path_arg(output), path_arg(path)],
        ));
        args
    }
}

#[async_trait]
impl Binder for Jpegtran {
    fn name(&self) -> &str {
        self.command.name()
    }

    fn kind(&self) -> ImageKind {
        ImageKind::Jpeg
    }

    async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError> {
        let staged = StagedOutput::beside(path)?;
        self.command
            .run(&self.command_args(path, staged.path()), timeout)
            .await?;
        staged.commit(path).await?;
        Ok(())
    }
}
