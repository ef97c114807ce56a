//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore della pipeline di upload.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli esiti negativi
//! - Distingue i segnali di pass-through (file non idoneo) dai veri fallimenti
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `IneligibleType`: Content type dichiarato non supportato (pass-through)
//! - `MissingPath`: Nessun path fornito dall'host (pass-through)
//! - `UnsupportedFormat`: Contenuto reale non riconosciuto come immagine
//! - `ToolUnavailable`: Nessun tool esterno disponibile per il formato
//! - `ToolExecutionFailed`: Il tool esterno è fallito (exit code, timeout, spawn)
//! - `StatFailed`: Lettura dimensione dopo l'ottimizzazione fallita
//! - `Io`: Errori di I/O (lettura dell'header, file temporanei)
//!
//! ## Politica:
//! Nessuno di questi errori esce da `UploadPipeline::process`: vengono tutti convertiti
//! in un pass-through del descriptor originale.
//!
//! ## Esempio:
//! ```ignore
//! if binders.is_empty() {
//!     return Err(OptimizeError::ToolUnavailable("png".to_string()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for upload optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Ineligible content type: {0}")]
    IneligibleType(String),

    #[error("No file path supplied")]
    MissingPath,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No optimizer available for {0}")]
    ToolUnavailable(String),

    #[error("{tool} failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },

    #[error("Failed to stat {}: {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OptimizeError {
    /// Eligibility signals that are not failures at all.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::IneligibleType(_) | Self::MissingPath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_through_classification() {
        assert!(OptimizeError::IneligibleType("text/plain".into()).is_pass_through());
        assert!(OptimizeError::MissingPath.is_pass_through());
        assert!(!OptimizeError::ToolUnavailable("gif".into()).is_pass_through());
        assert!(!OptimizeError::ToolExecutionFailed {
            tool: "optipng".into(),
            reason: "exit status: 1".into(),
        }
        .is_pass_through());
    }

    #[test]
    fn test_stat_failed_message() {
        let err = OptimizeError::StatFailed {
            path: PathBuf::from("/tmp/gone.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to stat /tmp/gone.png: not found");
    }
}
