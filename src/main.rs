//! # Upload Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso della CLI.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione (file JSON + environment)
//! - Elaborazione concorrente dei file come fossero upload appena ricevuti
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (path, tipo dichiarato, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` se presente)
//! 3. Carica e valida la configurazione
//! 4. Con `--tools` stampa il report dei tool ed esce
//! 5. Altrimenti passa ogni file alla `UploadPipeline` con concorrenza limitata
//!
//! ## Esempio di utilizzo:
//! ```bash
//! upload-optimizer ./uploads --workers 8 --verbose
//! upload-optimizer avatar.bin --type image/png --json
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use upload_optimizer::file_manager::FileManager;
use upload_optimizer::json_output::JsonMessage;
use upload_optimizer::progress::{OptimizationStats, Outcome, ProgressManager};
use upload_optimizer::tool_resolver::ToolPathResolver;
use upload_optimizer::{FileDescriptor, OptimizeError, OptimizerConfig, UploadPipeline};

#[derive(Parser)]
#[command(name = "upload-optimizer")]
#[command(about = "Losslessly shrink uploaded GIF, JPEG and PNG files with external optimizers")]
struct Args {
    /// Files or directories to treat as uploads
    paths: Vec<PathBuf>,

    /// Declared content type for every upload (guessed from the extension otherwise)
    #[arg(short = 't', long = "type")]
    declared_type: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep going through a PNG chain when a tool fails
    #[arg(long)]
    ignore_errors: bool,

    /// Number of parallel workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Emit one JSON object per event on stdout
    #[arg(long)]
    json: bool,

    /// Print which optimizer tools are available and exit
    #[arg(long)]
    tools: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => OptimizerConfig::from_file(path).await?,
        None => OptimizerConfig::default(),
    }
    .with_env_overrides();
    if args.ignore_errors {
        config.ignore_errors = true;
    }
    config.validate()?;

    if args.tools {
        let resolver = ToolPathResolver::new(config.tools_dir.clone());
        print!("{}", resolver.get_tools_report(&config.merged_options()));
        return Ok(());
    }

    if args.paths.is_empty() {
        return Err(anyhow::anyhow!("No input paths given (use --tools to inspect optimizers)"));
    }
    if args.workers == 0 {
        return Err(anyhow::anyhow!("Workers must be at least 1"));
    }
    for path in &args.paths {
        if !path.exists() {
            return Err(anyhow::anyhow!("Path does not exist: {}", path.display()));
        }
    }

    let uploads: Vec<PathBuf> = args
        .paths
        .iter()
        .flat_map(|path| FileManager::find_uploads(path))
        .collect();

    let start_time = Instant::now();
    if args.json {
        JsonMessage::start(uploads.len(), args.workers, config.ignore_errors).emit();
    } else {
        info!("Processing {} uploads with {} workers", uploads.len(), args.workers);
    }

    let progress = if args.json {
        ProgressManager::hidden()
    } else {
        ProgressManager::new(uploads.len() as u64)
    };

    let pipeline = Arc::new(UploadPipeline::new(config));
    let semaphore = Arc::new(Semaphore::new(args.workers));
    let mut tasks = Vec::with_capacity(uploads.len());

    for path in uploads {
        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        let declared_type = args
            .declared_type
            .clone()
            .unwrap_or_else(|| FileManager::declared_type_for(&path).to_string());

        let task = tokio::spawn(async move {
            let _permit = permit;
            let size = FileManager::file_size(&path).await?;
            let mut file = FileDescriptor::new(path, declared_type, size);

            let result = pipeline.try_process(&file).await;
            if let Ok(new_size) = result {
                file.size = new_size;
            }
            Ok::<_, OptimizeError>((size, file, result))
        });
        tasks.push(task);
    }

    let mut stats = OptimizationStats::new();
    for task in tasks {
        match task.await? {
            Ok((original_size, file, result)) => {
                let outcome = stats.record(original_size, &result);
                let error = match (&result, outcome) {
                    (Err(e), Outcome::Error) => {
                        warn!("Optimization failed for {:?}, keeping original: {}", file.path, e);
                        Some(e.to_string())
                    }
                    _ => None,
                };

                if args.json {
                    JsonMessage::file_complete(original_size, &file, outcome, error).emit();
                }
                progress.update(&completion_message(&file, original_size, outcome));
            }
            Err(e) => {
                stats.add_error(0);
                error!("Could not read upload: {}", e);
                if args.json {
                    JsonMessage::error("Could not read upload".to_string(), Some(e.to_string()))
                        .emit();
                }
                progress.update("❌ unreadable upload");
            }
        }
    }

    progress.finish(&stats.format_summary());
    if args.json {
        JsonMessage::complete(&stats, start_time.elapsed().as_secs_f64()).emit();
    } else {
        info!("{}", stats.format_summary());
        info!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

fn completion_message(file: &FileDescriptor, original_size: u64, outcome: Outcome) -> String {
    let name = file
        .path()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match outcome {
        Outcome::Optimized => format!(
            "✅ {}: {:.1}% saved",
            name,
            FileManager::calculate_reduction(original_size, file.size)
        ),
        Outcome::Skipped => format!("⏭️  {}", name),
        Outcome::Error => format!("❌ {}", name),
    }
}
