//! # Optimizer Registry Module
//!
//! Questo modulo risolve, una sola volta, l'insieme dei tool esterni
//! disponibili e lo condivide tra tutti gli upload.
//!
//! ## Responsabilità:
//! - Unisce la configurazione dell'host ai default (`OptimizerOptions`)
//! - Applica l'hook opzionale che può riscrivere le opzioni finali
//! - Risolve i binari (override → tools dir → PATH) e crea i `Binder`
//! - Mantiene in cache l'`OptimizerHandle` risultante
//! - Esegue la catena di binder adatta al formato del file
//!
//! ## Resolve-once:
//! Solo la prima chiamata a `resolve` costruisce i binding. Le chiamate
//! successive, anche con una configurazione diversa, restituiscono lo stesso
//! handle: modifiche tardive alla configurazione vengono ignorate.
//! Chiamate concorrenti alla prima risoluzione attendono e ricevono lo
//! stesso handle (`OnceLock`).
//!
//! ## Catene per formato:
//! - **PNG**: tutti i tool in ordine; con `ignore_errors` un fallimento
//!   viene loggato e la catena prosegue
//! - **JPEG / GIF / SVG**: il primo tool che riesce vince
//!
//! ## Esempio:
//! ```ignore
//! let registry = OptimizerRegistry::new()
//!     .with_options_hook(Arc::new(|mut options: OptimizerOptions| {
//!         options.ignore_errors = true;
//!         options
//!     }));
//! let handle = registry.resolve(&config);
//! handle.optimize(&path, ImageKind::Png).await?;
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use crate::binder::{self, Binder};
use crate::config::{OptimizerConfig, OptimizerOptions};
use crate::error::OptimizeError;
use crate::tool::{ChainMode, ImageKind, Tool};
use crate::tool_resolver::ToolPathResolver;

/// Final adjustment applied to the merged options before binding resolution
pub type OptionsHook = Arc<dyn Fn(OptimizerOptions) -> OptimizerOptions + Send + Sync>;

#[derive(Debug)]
struct Optimizer {
    options: OptimizerOptions,
    binders: Vec<Arc<dyn Binder>>,
}

/// Shared handle to a resolved set of tool bindings
#[derive(Debug, Clone)]
pub struct OptimizerHandle {
    inner: Arc<Optimizer>,
}

impl OptimizerHandle {
    pub fn new(options: OptimizerOptions, binders: Vec<Arc<dyn Binder>>) -> Self {
        Self {
            inner: Arc::new(Optimizer { options, binders }),
        }
    }

    /// Options the bindings were built from
    pub fn options(&self) -> &OptimizerOptions {
        &self.inner.options
    }

    /// Names of all bindings, in execution order
    pub fn binder_names(&self) -> Vec<&str> {
        self.inner.binders.iter().map(|b| b.name()).collect()
    }

    pub fn binders_for(&self, kind: ImageKind) -> Vec<&Arc<dyn Binder>> {
        self.inner
            .binders
            .iter()
            .filter(|b| b.kind() == kind)
            .collect()
    }

    /// Whether both handles share the same resolution
    pub fn ptr_eq(&self, other: &OptimizerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the binder chain for `kind` against `path`
    pub async fn optimize(&self, path: &Path, kind: ImageKind) -> Result<(), OptimizeError> {
        let binders = self.binders_for(kind);
        if binders.is_empty() {
            return Err(OptimizeError::ToolUnavailable(kind.to_string()));
        }

        let timeout = self.options().timeout;
        let mut last_error = None;

        match kind.chain_mode() {
            ChainMode::FirstSuccess => {
                for binder in binders {
                    match binder.optimize(path, timeout).await {
                        Ok(()) => {
                            debug!("{} optimized with {}: {}", kind, binder.name(), path.display());
                            return Ok(());
                        }
                        Err(e) => {
                            warn!("{} optimization failed with {}, trying next tool: {}", kind, binder.name(), e);
                            last_error = Some(e);
                        }
                    }
                }
                Err(last_error.unwrap_or_else(|| OptimizeError::ToolUnavailable(kind.to_string())))
            }
            ChainMode::RunAll => {
                let mut succeeded = 0;
                for binder in binders {
                    match binder.optimize(path, timeout).await {
                        Ok(()) => {
                            debug!("{} pass with {} done: {}", kind, binder.name(), path.display());
                            succeeded += 1;
                        }
                        Err(e) if self.options().ignore_errors => {
                            warn!("Ignoring {} failure: {}", binder.name(), e);
                            last_error = Some(e);
                        }
                        Err(e) => return Err(e),
                    }
                }

                match last_error {
                    Some(e) if succeeded == 0 => Err(e),
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Lazily resolves and caches the optimizer bindings
#[derive(Default)]
pub struct OptimizerRegistry {
    handle: OnceLock<OptimizerHandle>,
    options_hook: Option<OptionsHook>,
    extra_binders: Vec<Arc<dyn Binder>>,
    search_path: Option<OsString>,
}

impl OptimizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the final options adjustment
    pub fn with_options_hook(mut self, hook: OptionsHook) -> Self {
        self.options_hook = Some(hook);
        self
    }

    /// Append a custom binder after the built-in ones
    pub fn with_binder(mut self, binder: Arc<dyn Binder>) -> Self {
        self.extra_binders.push(binder);
        self
    }

    /// Search this path instead of the process `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Handle for this registry, built from `config` on the first call only.
    pub fn resolve(&self, config: &OptimizerConfig) -> OptimizerHandle {
        self.handle.get_or_init(|| self.build(config)).clone()
    }

    /// Cached handle, if resolution already happened
    pub fn resolved(&self) -> Option<&OptimizerHandle> {
        self.handle.get()
    }

    fn build(&self, config: &OptimizerConfig) -> OptimizerHandle {
        let mut options = config.merged_options();
        if let Some(ref hook) = self.options_hook {
            options = hook(options);
        }

        let resolver = match self.search_path {
            Some(ref search_path) => ToolPathResolver::with_search_path(
                options.tools_dir.clone(),
                Some(search_path.clone()),
            ),
            None => ToolPathResolver::new(options.tools_dir.clone()),
        };

        let mut binders = Vec::new();
        for tool in Tool::ALL {
            let override_path = options.binaries.get(&tool).map(PathBuf::as_path);
            match resolver.resolve(tool, override_path) {
                Some(program) => binders.push(binder::builtin(
                    tool,
                    program,
                    options.options_for(tool).to_vec(),
                )),
                None => debug!("{} not available, not bound", tool),
            }
        }
        binders.extend(self.extra_binders.iter().cloned());

        let handle = OptimizerHandle::new(options, binders);
        info!("Resolved optimizer bindings: [{}]", handle.binder_names().join(", "));
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Binder that records calls and fails on demand
    #[derive(Debug)]
    struct ScriptedBinder {
        name: String,
        kind: ImageKind,
        fail: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedBinder {
        fn new(name: &str, kind: ImageKind, fail: bool, calls: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Binder> {
            Arc::new(Self {
                name: name.to_string(),
                kind,
                fail,
                calls: calls.clone(),
            })
        }
    }

    #[async_trait]
    impl Binder for ScriptedBinder {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> ImageKind {
            self.kind
        }

        async fn optimize(&self, _path: &Path, _timeout: Duration) -> Result<(), OptimizeError> {
            self.calls.lock().unwrap().push(self.name.clone());
            if self.fail {
                Err(OptimizeError::ToolExecutionFailed {
                    tool: self.name.clone(),
                    reason: "exit status: 1".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn empty_registry() -> OptimizerRegistry {
        OptimizerRegistry::new().with_search_path("")
    }

    #[test]
    fn test_resolve_once_keeps_first_config() {
        let registry = empty_registry();

        let mut first = OptimizerConfig::default();
        first.options.insert(Tool::Jpegoptim, vec!["--max=60".to_string()]);
        let mut second = OptimizerConfig::default();
        second.options.insert(Tool::Jpegoptim, vec!["--max=90".to_string()]);
        second.ignore_errors = true;

        assert!(registry.resolved().is_none());
        let a = registry.resolve(&first);
        let b = registry.resolve(&second);

        assert!(a.ptr_eq(&b));
        assert_eq!(b.options().options_for(Tool::Jpegoptim), ["--max=60"]);
        assert!(!b.options().ignore_errors);
    }

    #[test]
    fn test_concurrent_first_resolve_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let registry = empty_registry().with_options_hook(Arc::new(move |options: OptimizerOptions| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            options
        }));

        const CALLERS: usize = 8;
        let barrier = Barrier::new(CALLERS);
        let config = OptimizerConfig::default();

        let (barrier, registry, config) = (&barrier, &registry, &config);
        let handles: Vec<OptimizerHandle> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..CALLERS)
                .map(|_| {
                    scope.spawn(move || {
                        barrier.wait();
                        registry.resolve(config)
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| h.ptr_eq(&handles[0])));
    }

    #[test]
    fn test_options_hook_rewrites_before_binding() {
        let bin = TempDir::new().unwrap();
        let gifsicle = bin.path().join("my-gifsicle");
        std::fs::write(&gifsicle, b"").unwrap();

        let hook_target = gifsicle.clone();
        let registry = empty_registry().with_options_hook(Arc::new(move |mut options: OptimizerOptions| {
            options.binaries.insert(Tool::Gifsicle, hook_target.clone());
            options.tool_options.insert(Tool::Gifsicle, vec!["-O3".to_string()]);
            options
        }));

        let handle = registry.resolve(&OptimizerConfig::default());
        assert_eq!(handle.binder_names(), vec!["gifsicle"]);
        assert_eq!(handle.options().options_for(Tool::Gifsicle), ["-O3"]);
        assert_eq!(handle.binders_for(ImageKind::Gif).len(), 1);
        assert!(handle.binders_for(ImageKind::Png).is_empty());
    }

    #[test]
    fn test_unavailable_tools_are_not_bound() {
        let mut config = OptimizerConfig::default();
        config
            .binaries
            .insert(Tool::Optipng, PathBuf::from("/nonexistent/optipng"));

        let handle = empty_registry().resolve(&config);
        assert!(handle.binder_names().is_empty());
    }

    #[tokio::test]
    async fn test_no_binding_is_tool_unavailable() {
        let handle = empty_registry().resolve(&OptimizerConfig::default());
        let err = handle
            .optimize(Path::new("/tmp/a.gif"), ImageKind::Gif)
            .await
            .unwrap_err();
        assert!(matches!(err, OptimizeError::ToolUnavailable(_)));
    }

    #[tokio::test]
    async fn test_jpeg_chain_stops_at_first_success() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handle = empty_registry()
            .with_binder(ScriptedBinder::new("first", ImageKind::Jpeg, true, &calls))
            .with_binder(ScriptedBinder::new("second", ImageKind::Jpeg, false, &calls))
            .with_binder(ScriptedBinder::new("third", ImageKind::Jpeg, false, &calls))
            .resolve(&OptimizerConfig::default());

        handle
            .optimize(Path::new("/tmp/a.jpg"), ImageKind::Jpeg)
            .await
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_png_chain_aborts_without_ignore_errors() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handle = empty_registry()
            .with_binder(ScriptedBinder::new("quant", ImageKind::Png, false, &calls))
            .with_binder(ScriptedBinder::new("crush", ImageKind::Png, true, &calls))
            .with_binder(ScriptedBinder::new("adv", ImageKind::Png, false, &calls))
            .resolve(&OptimizerConfig::default());

        let err = handle
            .optimize(Path::new("/tmp/a.png"), ImageKind::Png)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("crush failed"));
        assert_eq!(*calls.lock().unwrap(), vec!["quant", "crush"]);
    }

    #[tokio::test]
    async fn test_png_chain_continues_with_ignore_errors() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let config = OptimizerConfig {
            ignore_errors: true,
            ..Default::default()
        };
        let handle = empty_registry()
            .with_binder(ScriptedBinder::new("quant", ImageKind::Png, true, &calls))
            .with_binder(ScriptedBinder::new("crush", ImageKind::Png, false, &calls))
            .resolve(&config);

        handle
            .optimize(Path::new("/tmp/a.png"), ImageKind::Png)
            .await
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["quant", "crush"]);

        // Every tool failing is still a failure
        let failing = empty_registry()
            .with_binder(ScriptedBinder::new("quant", ImageKind::Png, true, &calls))
            .resolve(&config);
        assert!(failing
            .optimize(Path::new("/tmp/a.png"), ImageKind::Png)
            .await
            .is_err());
    }
}
