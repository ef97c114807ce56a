//! GIF binder: gifsicle in batch mode, which rewrites the input file.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{path_arg, Binder, ToolCommand};
use crate::error::OptimizeError;
use crate::tool::ImageKind;
use crate::utils::with_trailing;

#[derive(Debug)]
pub struct Gifsicle {
    command: ToolCommand,
}

impl Gifsicle {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command_args(&self, path: &Path) -> Vec<String> {
        let mut args = crate::args!["-b", "-O5"];
        args.extend(with_trailing(self.command.options(), &[path_arg(path)]));
        args
    }
}

#[async_trait]
impl Binder for Gifsicle {
    fn name(&self) -> &str {
        self.command.name()
    }

    fn kind(&self) -> ImageKind {
        ImageKind::Gif
    }

    async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError> {
        self.command.run(&self.command_args(path), timeout).await
    }
}
