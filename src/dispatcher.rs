//! # Upload Dispatcher
//!
//! Punto di ingresso della pipeline: riceve il descriptor di un upload,
//! decide se è idoneo e, in caso, delega al `TransformRunner`.
//!
//! ## Flusso:
//! 1. Content type dichiarato non in {gif, jpeg, png} → pass-through
//! 2. Path mancante → pass-through
//! 3. Risoluzione (lazy, una sola volta) dell'`OptimizerHandle`
//! 4. Ottimizzazione; in caso di successo aggiorna `size`
//!
//! ## Best-effort:
//! Ogni errore del runner viene loggato e il descriptor torna invariato.
//! Un fallimento dell'ottimizzazione non blocca mai l'upload.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::OptimizerConfig;
use crate::descriptor::FileDescriptor;
use crate::error::OptimizeError;
use crate::registry::OptimizerRegistry;
use crate::runner::{ToolRunner, TransformRunner};

/// Pipeline context owning the configuration, the lazily resolved
/// optimizer bindings and the runner.
pub struct UploadPipeline {
    config: OptimizerConfig,
    registry: OptimizerRegistry,
    runner: Arc<dyn TransformRunner>,
}

impl UploadPipeline {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_registry(config, OptimizerRegistry::new())
    }

    pub fn with_registry(config: OptimizerConfig, registry: OptimizerRegistry) -> Self {
        Self {
            config,
            registry,
            runner: Arc::new(ToolRunner),
        }
    }

    /// Replace the default [`ToolRunner`]
    pub fn with_runner(mut self, runner: Arc<dyn TransformRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn registry(&self) -> &OptimizerRegistry {
        &self.registry
    }

    /// Optimize an uploaded file, best effort.
    ///
    /// Returns the descriptor with `size` updated on success, unchanged
    /// otherwise. Never fails.
    pub async fn process(&self, mut file: FileDescriptor) -> FileDescriptor {
        match self.try_process(&file).await {
            Ok(size) => {
                debug!(
                    "Optimized upload {:?}: {} -> {} bytes",
                    file.path, file.size, size
                );
                file.size = size;
            }
            Err(e) if e.is_pass_through() => {
                debug!("Skipping upload {:?}: {}", file.path, e);
            }
            Err(e) => {
                warn!("Optimization failed for {:?}, keeping original: {}", file.path, e);
            }
        }
        file
    }

    /// Same decision path as [`process`](Self::process), surfacing the outcome
    pub async fn try_process(&self, file: &FileDescriptor) -> Result<u64, OptimizeError> {
        if !file.is_eligible() {
            return Err(OptimizeError::IneligibleType(file.declared_type.clone()));
        }
        let path = file.path().ok_or(OptimizeError::MissingPath)?;

        let handle = self.registry.resolve(&self.config);
        self.runner.optimize(&handle, path).await
    }
}
