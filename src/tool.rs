//! Known optimizer tools and the image kinds they operate on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External optimizer binaries the registry knows how to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Advpng,
    Gifsicle,
    Jpegoptim,
    Jpegtran,
    Optipng,
    Pngcrush,
    Pngout,
    Pngquant,
    Svgo,
}

impl Tool {
    /// Binding order. Within a kind, tools run in this order.
    pub const ALL: [Tool; 9] = [
        Tool::Pngquant,
        Tool::Optipng,
        Tool::Pngcrush,
        Tool::Pngout,
        Tool::Advpng,
        Tool::Jpegoptim,
        Tool::Jpegtran,
        Tool::Gifsicle,
        Tool::Svgo,
    ];

    /// Executable name, also used as the config key
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Advpng => "advpng",
            Tool::Gifsicle => "gifsicle",
            Tool::Jpegoptim => "jpegoptim",
            Tool::Jpegtran => "jpegtran",
            Tool::Optipng => "optipng",
            Tool::Pngcrush => "pngcrush",
            Tool::Pngout => "pngout",
            Tool::Pngquant => "pngquant",
            Tool::Svgo => "svgo",
        }
    }

    /// Image kind this tool optimizes
    pub fn kind(&self) -> ImageKind {
        match self {
            Tool::Advpng | Tool::Optipng | Tool::Pngcrush | Tool::Pngout | Tool::Pngquant => {
                ImageKind::Png
            }
            Tool::Jpegoptim | Tool::Jpegtran => ImageKind::Jpeg,
            Tool::Gifsicle => ImageKind::Gif,
            Tool::Svgo => ImageKind::Svg,
        }
    }

    /// Suffix of the environment variable carrying a binary override
    pub fn env_suffix(&self) -> String {
        self.name().to_uppercase()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Actual content kind of a file, as sniffed from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
    Svg,
}

/// How the bindings for one kind are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainMode {
    /// Stop at the first tool that succeeds
    FirstSuccess,
    /// Run every bound tool in order
    RunAll,
}

impl ImageKind {
    pub fn chain_mode(&self) -> ChainMode {
        match self {
            ImageKind::Png => ChainMode::RunAll,
            ImageKind::Gif | ImageKind::Jpeg | ImageKind::Svg => ChainMode::FirstSuccess,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Gif => "GIF",
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Svg => "SVG",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_chain_order() {
        let png: Vec<Tool> = Tool::ALL
            .iter()
            .copied()
            .filter(|t| t.kind() == ImageKind::Png)
            .collect();
        assert_eq!(
            png,
            vec![Tool::Pngquant, Tool::Optipng, Tool::Pngcrush, Tool::Pngout, Tool::Advpng]
        );
        assert_eq!(ImageKind::Png.chain_mode(), ChainMode::RunAll);
        assert_eq!(ImageKind::Jpeg.chain_mode(), ChainMode::FirstSuccess);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Tool::Svgo).unwrap(), "\"svgo\"");
        assert_eq!(Tool::Gifsicle.env_suffix(), "GIFSICLE");
    }
}
