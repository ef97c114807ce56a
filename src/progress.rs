//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche della CLI.
//!
//! ## Responsabilità:
//! - Progress bar con `indicatif` per feedback real-time
//! - Classificazione dell'esito di ogni upload
//! - Calcolo percentuali di riduzione e byte risparmiati
//!
//! ## Statistiche tracciate:
//! - **files_processed**: Totale upload elaborati
//! - **files_optimized**: Upload effettivamente ridotti
//! - **files_skipped**: Upload non idonei o non ridotti
//! - **total_bytes_saved**: Byte totali risparmiati
//! - **total_original_size**: Dimensione totale degli upload originali
//! - **errors**: Ottimizzazioni fallite (l'upload resta invariato)
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [=========>------------------------------] 12/48 (25%) ✅ logo.png: 38.1% saved
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::error::OptimizeError;
use crate::file_manager::FileManager;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Manages the progress bar for a batch of uploads
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing, for machine-readable output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Advance by one upload and show a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// How a single upload ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Optimized,
    Skipped,
    Error,
}

/// Statistics tracker for a batch of uploads
#[derive(Debug, Default)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_skipped: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
    pub errors: usize,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and record the result of one upload
    pub fn record(&mut self, original_size: u64, result: &Result<u64, OptimizeError>) -> Outcome {
        match result {
            Ok(new_size) if *new_size < original_size => {
                self.add_optimized(original_size, *new_size);
                Outcome::Optimized
            }
            Ok(_) => {
                self.add_skipped(original_size);
                Outcome::Skipped
            }
            Err(e) if e.is_pass_through() => {
                self.add_skipped(original_size);
                Outcome::Skipped
            }
            Err(_) => {
                self.add_error(original_size);
                Outcome::Error
            }
        }
    }

    pub fn add_optimized(&mut self, original_size: u64, new_size: u64) {
        self.files_processed += 1;
        self.files_optimized += 1;
        self.total_original_size += original_size;
        self.total_bytes_saved += original_size.saturating_sub(new_size);
    }

    pub fn add_skipped(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.files_skipped += 1;
        self.total_original_size += original_size;
    }

    pub fn add_error(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.errors += 1;
        self.total_original_size += original_size;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(
            self.total_original_size,
            self.total_original_size - self.total_bytes_saved,
        )
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} uploads | Optimized: {} | Skipped: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_skipped,
            self.errors,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}
