//! # JSON Output Module
//!
//! Output strutturato in JSON (una riga per evento) per l'integrazione con
//! altri processi che guidano la CLI.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_complete`: Fine elaborazione di un upload
//! - `complete`: Fine batch con statistiche finali
//! - `error`: Errore generale

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::descriptor::FileDescriptor;
use crate::file_manager::FileManager;
use crate::progress::{OptimizationStats, Outcome};

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        total_files: usize,
        workers: usize,
        ignore_errors: bool,
    },

    FileComplete {
        path: Option<PathBuf>,
        declared_type: String,
        original_size: u64,
        optimized_size: u64,
        reduction_percent: f64,
        optimized: bool,
        error: Option<String>,
    },

    Complete {
        files_processed: usize,
        files_optimized: usize,
        files_skipped: usize,
        errors: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(total_files: usize, workers: usize, ignore_errors: bool) -> Self {
        Self::Start {
            total_files,
            workers,
            ignore_errors,
        }
    }

    /// Completamento di un upload, a partire dal descriptor finale
    pub fn file_complete(
        original_size: u64,
        file: &FileDescriptor,
        outcome: Outcome,
        error: Option<String>,
    ) -> Self {
        Self::FileComplete {
            path: file.path.clone(),
            declared_type: file.declared_type.clone(),
            original_size,
            optimized_size: file.size,
            reduction_percent: FileManager::calculate_reduction(original_size, file.size),
            optimized: outcome == Outcome::Optimized,
            error,
        }
    }

    pub fn complete(stats: &OptimizationStats, duration_seconds: f64) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_optimized: stats.files_optimized,
            files_skipped: stats.files_skipped,
            errors: stats.errors,
            total_bytes_saved: stats.total_bytes_saved,
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
