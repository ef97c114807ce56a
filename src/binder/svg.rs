//! SVG binder. svgo overwrites its input when no output is given.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{path_arg, Binder, ToolCommand};
use crate::error::OptimizeError;
use crate::tool::ImageKind;
use crate::utils::with_trailing;

#[derive(Debug)]
pub struct Svgo {
    command: ToolCommand,
}

impl Svgo {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command_args(&self, path: &Path) -> Vec<String> {
        with_trailing(self.command.options(), &[path_arg(path)])
    }
}

#[async_trait]
impl Binder for Svgo {
    fn name(&self) -> &str {
        self.command.name()
    }

    fn kind(&self) -> ImageKind {
        ImageKind::Svg
    }

    async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError> {
        self.command.run(&self.command_args(path), timeout).await
    }
}
