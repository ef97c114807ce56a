//! PNG binders.
//!
//! Every bound PNG tool runs in turn: pngquant first (lossy palette
//! reduction), then the lossless recompressors.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{path_arg, Binder, StagedOutput, ToolCommand};
use crate::error::OptimizeError;
use crate::tool::ImageKind;
use crate::utils::with_trailing;

/// pngquant exit codes for "quality too low" and "result larger than input"
const PNGQUANT_SKIPPED: [i32; 2] = [98, 99];

/// pngout exit code for "unable to compress further"
const PNGOUT_UNCHANGED: [i32; 1] = [2];

/// Lossy palette quantization. Output goes to a staged file, so `--force`
/// is required for pngquant to overwrite it; it is added if the configured
/// flags lack it.
#[derive(Debug)]
pub struct Pngquant {
    command: ToolCommand,
}

impl Pngquant {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command_args(&self, path: &Path, output: &Path) -> Vec<String> {
        let mut args = self.command.options().to_vec();
        if !args.iter().any(|a| a == "--force" || a == "-f") {
            args.push("--force".to_string());
        }
        args.extend(["--output".to_string(), path_arg(output), path_arg(path)]);
        args
    }
}

#[async_trait]
impl Binder for Pngquant {
    fn name(&self) -> &str {
        self.command.name()
    }

    fn kind(&self) -> ImageKind {
        ImageKind::Png
    }

    async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError> {
        let staged = StagedOutput::beside(path)?;
        self.command
            .run_accepting(&self.command_args(path, staged.path()), timeout, &PNGQUANT_SKIPPED)
            .await?;
        staged.commit(path).await?;
        Ok(())
    }
}

/// Defines a PNG binder that rewrites the file in place:
/// `<program> <fixed flags> <configured flags> <path>`.
macro_rules! in_place_png_binder {
    ($(#[$doc:meta])* $name:ident, [$($flag:expr),*], accepting = $accepted:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            command: ToolCommand,
        }

        impl $name {
            pub fn new(command: ToolCommand) -> Self {
                Self { command }
            }

            pub fn command_args(&self, path: &Path) -> Vec<String> {
                let mut args = crate::args![$($flag),*];
                args.extend(with_trailing(self.command.options(), &[path_arg(path)]));
                args
            }
        }

        #[async_trait]
        impl Binder for $name {
            fn name(&self) -> &str {
                self.command.name()
            }

            fn kind(&self) -> ImageKind {
                ImageKind::Png
            }

            async fn optimize(&self, path: &Path, timeout: Duration) -> Result<(), OptimizeError> {
                self.command
                    .run_accepting(&self.command_args(path), timeout, &$accepted)
                    .await
            }
        }
    };
}

in_place_png_binder!(
    /// Lossless recompression with a fast trial count
    Optipng,
    ["-i0", "-o2", "-quiet"],
    accepting = []
);

in_place_png_binder!(
    /// Brute-force chunk reduction, overwriting the input
    Pngcrush,
    ["-reduce", "-q", "-ow"],
    accepting = []
);

in_place_png_binder!(
    Pngout,
    ["-s3", "-q", "-y"],
    accepting = PNGOUT_UNCHANGED
);

in_place_png_binder!(
    /// Deflate recompression from advancecomp
    Advpng,
    ["-z", "-4", "-q"],
    accepting = []
);
