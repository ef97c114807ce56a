//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione degli optimizer esterni.
//!
//! ## Responsabilità:
//! - Definisce la struct `OptimizerConfig` fornita dall'host all'avvio
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Applica override da variabili d'ambiente (`UPLOAD_OPTIMIZER_*`)
//! - Produce `OptimizerOptions`, il set di opzioni unito ai default
//!
//! ## Parametri di configurazione:
//! - `binaries`: Path del binario per tool (default: discovery automatica)
//! - `options`: Lista di flag per tool (sostituisce quella di default)
//! - `ignore_errors`: Continua la catena PNG se un tool fallisce (default: false)
//! - `timeout_secs`: Timeout per ogni processo esterno (default: 180)
//! - `tools_dir`: Directory con tool bundled (default: None)
//!
//! ## Opzioni di default:
//! - jpegoptim: `--strip-all --all-progressive --max=75`
//! - pngquant: `--force`
//!
//! ## Esempio:
//! ```ignore
//! let config = OptimizerConfig::from_file(&path).await?.with_env_overrides();
//! config.validate()?;
//! let options = config.merged_options();
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tool::Tool;

/// Prefix of every environment variable read by [`OptimizerConfig::with_env_overrides`]
pub const ENV_PREFIX: &str = "UPLOAD_OPTIMIZER";

/// Default per-process timeout for external tools
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Host-supplied configuration for the optimizer registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Binary path overrides per tool
    pub binaries: BTreeMap<Tool, PathBuf>,
    /// Flag-list overrides per tool
    pub options: BTreeMap<Tool, Vec<String>>,
    /// Keep running a chain after a tool failure
    pub ignore_errors: bool,
    /// Timeout for a single external process, in seconds
    pub timeout_secs: u64,
    /// Directory holding bundled tool binaries
    pub tools_dir: Option<PathBuf>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            binaries: BTreeMap::new(),
            options: BTreeMap::new(),
            ignore_errors: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            tools_dir: None,
        }
    }
}

/// Fully merged option set handed to binding resolution.
///
/// This is what an [`OptionsHook`](crate::registry::OptionsHook) receives and
/// may rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOptions {
    pub ignore_errors: bool,
    pub timeout: Duration,
    pub binaries: BTreeMap<Tool, PathBuf>,
    pub tool_options: BTreeMap<Tool, Vec<String>>,
    pub tools_dir: Option<PathBuf>,
}

impl OptimizerOptions {
    /// Flag list for a tool, empty when none is configured
    pub fn options_for(&self, tool: Tool) -> &[String] {
        self.tool_options
            .get(&tool)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        OptimizerConfig::default().merged_options()
    }
}

/// Default flag lists applied before any override
pub fn default_tool_options() -> BTreeMap<Tool, Vec<String>> {
    let mut options = BTreeMap::new();
    options.insert(
        Tool::Jpegoptim,
        crate::args!["--strip-all", "--all-progressive", "--max=75"],
    );
    options.insert(Tool::Pngquant, crate::args!["--force"]);
    options
}

impl OptimizerConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Tool timeout must be greater than 0 seconds"));
        }

        for (tool, path) in &self.binaries {
            if path.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("Binary override for {} is empty", tool));
            }
        }

        if let Some(ref tools_dir) = self.tools_dir {
            if !tools_dir.is_dir() {
                return Err(anyhow::anyhow!(
                    "Tools directory is not a directory: {}",
                    tools_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: OptimizerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Overlay values from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for tool in Tool::ALL {
            let key = format!("{}_BIN_{}", ENV_PREFIX, tool.env_suffix());
            if let Some(value) = lookup(&key).filter(|v| !v.is_empty()) {
                self.binaries.insert(tool, PathBuf::from(value));
            }
        }

        if let Some(dir) = lookup(&format!("{}_TOOLS_DIR", ENV_PREFIX)).filter(|v| !v.is_empty()) {
            self.tools_dir = Some(PathBuf::from(dir));
        }

        if let Some(secs) = lookup(&format!("{}_TIMEOUT_SECS", ENV_PREFIX))
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.timeout_secs = secs;
        }

        self
    }

    /// Merge the overrides over the default option set
    pub fn merged_options(&self) -> OptimizerOptions {
        let mut tool_options = default_tool_options();
        for (tool, flags) in &self.options {
            tool_options.insert(*tool, flags.clone());
        }

        OptimizerOptions {
            ignore_errors: self.ignore_errors,
            timeout: Duration::from_secs(self.timeout_secs),
            binaries: self.binaries.clone(),
            tool_options,
            tools_dir: self.tools_dir.clone(),
        }
    }
}
