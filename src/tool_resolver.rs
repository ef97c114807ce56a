//! # Tool Path Resolver
//!
//! This module finds optimizer binaries in different environments:
//! - Explicit per-tool overrides from the configuration
//! - A bundled tools directory shipped next to the host
//! - System-installed tools on `PATH`

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::OptimizerOptions;
use crate::tool::Tool;

/// Tool path resolver for bundled and system binaries
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Base directory where tools are bundled
    tools_dir: Option<PathBuf>,
    /// Search path, captured once so resolution is consistent
    search_path: Option<OsString>,
}

impl ToolPathResolver {
    /// Create a resolver that searches `tools_dir` and then the system `PATH`
    pub fn new(tools_dir: Option<PathBuf>) -> Self {
        Self {
            tools_dir,
            search_path: env::var_os("PATH"),
        }
    }

    /// Create a resolver with an explicit search path instead of `PATH`
    pub fn with_search_path(tools_dir: Option<PathBuf>, search_path: Option<OsString>) -> Self {
        Self {
            tools_dir,
            search_path,
        }
    }

    /// Resolve the binary for a tool, honouring an optional override.
    ///
    /// An override containing a path separator must point at an existing
    /// file; a bare name is looked up on the search path instead of the
    /// tool's default name.
    pub fn resolve(&self, tool: Tool, override_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = override_path {
            return self.resolve_override(tool, path);
        }
        self.resolve_tool(tool.name())
    }

    fn resolve_override(&self, tool: Tool, path: &Path) -> Option<PathBuf> {
        if path.components().count() > 1 || path.is_absolute() {
            if path.is_file() {
                debug!("Using configured binary for {}: {:?}", tool, path);
                return Some(path.to_path_buf());
            }
            warn!("Configured binary for {} does not exist: {:?}", tool, path);
            return None;
        }

        let name = path.to_string_lossy();
        let resolved = self.find_in_system_path(&name);
        if resolved.is_none() {
            warn!("Configured binary for {} not found on PATH: {}", tool, name);
        }
        resolved
    }

    /// Resolve the path to a tool by executable name
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = self.get_bundled_tool_path(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        if let Some(system_path) = self.find_in_system_path(tool_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        debug!("Tool not found: {}", tool_name);
        None
    }

    /// Bundled binary in `tools/{platform}/{tool}` or `tools/{tool}`
    fn get_bundled_tool_path(&self, tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let platform = if cfg!(target_os = "macos") {
            "darwin"
        } else {
            env::consts::OS
        };
        let file_name = format!("{}{}", tool_name, env::consts::EXE_SUFFIX);

        [
            tools_dir.join(platform).join(&file_name),
            tools_dir.join(&file_name),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    /// Find tool in the search path
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let file_name = format!("{}{}", tool_name, env::consts::EXE_SUFFIX);

        env::split_paths(self.search_path.as_ref()?)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Get a report of tool availability for the given options
    pub fn get_tools_report(&self, options: &OptimizerOptions) -> String {
        let mut report = String::new();
        report.push_str("Optimizer Tool Report\n");
        report.push_str(&format!("Bundled tools dir: {:?}\n", self.tools_dir));

        for tool in Tool::ALL {
            let override_path = options.binaries.get(&tool).map(PathBuf::as_path);
            match self.resolve(tool, override_path) {
                Some(path) => {
                    report.push_str(&format!("  ✅ {} ({}) -> {:?}\n", tool, tool.kind(), path));
                }
                None => {
                    report.push_str(&format!(
                        "  ❌ {} ({}) (install with: {})\n",
                        tool,
                        tool.kind(),
                        Self::install_instructions(tool)
                    ));
                }
            }
        }

        report
    }

    /// Installation hint for a tool on Debian-like systems
    pub fn install_instructions(tool: Tool) -> &'static str {
        match tool {
            Tool::Advpng => "sudo apt-get install advancecomp",
            Tool::Gifsicle => "sudo apt-get install gifsicle",
            Tool::Jpegoptim => "sudo apt-get install jpegoptim",
            Tool::Jpegtran => "sudo apt-get install libjpeg-turbo-progs",
            Tool::Optipng => "sudo apt-get install optipng",
            Tool::Pngcrush => "sudo apt-get install pngcrush",
            Tool::Pngout => "download from http://www.jonof.id.au/kenutils",
            Tool::Pngquant => "sudo apt-get install pngquant",
            Tool::Svgo => "npm install -g svgo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"#!/bin/sh\n").unwrap();
    }

    #[test]
    fn test_resolves_from_search_path() {
        let bin = TempDir::new().unwrap();
        touch(&bin.path().join(format!("optipng{}", env::consts::EXE_SUFFIX)));

        let resolver =
            ToolPathResolver::with_search_path(None, Some(bin.path().as_os_str().to_owned()));

        assert_eq!(
            resolver.resolve(Tool::Optipng, None),
            Some(bin.path().join(format!("optipng{}", env::consts::EXE_SUFFIX)))
        );
        assert_eq!(resolver.resolve(Tool::Pngcrush, None), None);
    }

    #[test]
    fn test_bundled_dir_wins_over_path() {
        let tools = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let exe = format!("gifsicle{}", env::consts::EXE_SUFFIX);
        touch(&tools.path().join(&exe));
        touch(&bin.path().join(&exe));

        let resolver = ToolPathResolver::with_search_path(
            Some(tools.path().to_path_buf()),
            Some(bin.path().as_os_str().to_owned()),
        );

        assert_eq!(resolver.resolve(Tool::Gifsicle, None), Some(tools.path().join(&exe)));
    }

    #[test]
    fn test_override_paths() {
        let bin = TempDir::new().unwrap();
        let custom = bin.path().join("pngquant-2.17");
        touch(&custom);

        let resolver =
            ToolPathResolver::with_search_path(None, Some(bin.path().as_os_str().to_owned()));

        // Full path override
        assert_eq!(resolver.resolve(Tool::Pngquant, Some(&custom)), Some(custom.clone()));
        // Bare name override looked up on the search path
        assert_eq!(
            resolver.resolve(Tool::Pngquant, Some(Path::new("pngquant-2.17"))),
            Some(custom)
        );
        // Missing override does not fall back to the default name
        assert_eq!(
            resolver.resolve(Tool::Pngquant, Some(&bin.path().join("missing"))),
            None
        );
    }

    #[test]
    fn test_tools_report_lists_every_tool() {
        let resolver = ToolPathResolver::with_search_path(None, None);
        let report = resolver.get_tools_report(&OptimizerOptions::default());
        for tool in Tool::ALL {
            assert!(report.contains(tool.name()));
        }
        assert!(report.contains("advancecomp"));
    }
}
