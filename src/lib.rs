//! # Upload Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Ottimizza in modo trasparente le immagini caricate (GIF, JPEG, PNG)
//! - Espone i tipi principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per l'host che riceve gli upload
//!
//! ## Architettura dei moduli:
//! - `descriptor`: Descriptor del file caricato e idoneità per content type
//! - `dispatcher`: `UploadPipeline`, punto di ingresso best-effort
//! - `registry`: Risoluzione lazy e unica degli optimizer disponibili
//! - `runner`: Esecuzione della catena di tool su un singolo file
//! - `binder`: Un binder per ogni tool esterno (pngquant, jpegoptim, ...)
//! - `tool`: Catalogo dei tool e dei formati immagine
//! - `tool_resolver`: Ricerca dei binari (override, tools dir, PATH)
//! - `config`: Configurazione, validazione e override da environment
//! - `error`: Tipi di errore custom
//! - `file_manager`: Operazioni sui file, sniffing del formato, discovery
//! - `progress` / `json_output`: Feedback per la CLI
//!
//! ## Utilizzo:
//! ```ignore
//! use upload_optimizer::{FileDescriptor, OptimizerConfig, UploadPipeline};
//!
//! let pipeline = UploadPipeline::new(OptimizerConfig::default().with_env_overrides());
//! let file = pipeline
//!     .process(FileDescriptor::new("/tmp/upload.png", "image/png", 2048))
//!     .await;
//! println!("stored size: {}", file.size);
//! ```

pub mod binder;
pub mod config;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod progress;
pub mod registry;
pub mod runner;
pub mod tool;
pub mod tool_resolver;
pub mod utils;

pub use binder::Binder;
pub use config::{OptimizerConfig, OptimizerOptions};
pub use descriptor::FileDescriptor;
pub use dispatcher::UploadPipeline;
pub use error::OptimizeError;
pub use registry::{OptimizerHandle, OptimizerRegistry, OptionsHook};
pub use runner::{ToolRunner, TransformRunner};
pub use tool::{ImageKind, Tool};
