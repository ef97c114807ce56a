//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file caricati.
//!
//! ## Responsabilità:
//! - Lettura dimensione file dopo l'ottimizzazione
//! - Rilevamento del formato reale tramite magic bytes (content sniffing)
//! - Discovery ricorsiva di file in directory (modalità CLI)
//! - Stima del content type dichiarato a partire dall'estensione
//! - Formattazione human-readable delle dimensioni
//!
//! ## Content sniffing:
//! Il formato reale viene dedotto dai primi byte del file con
//! `image::guess_format` (PNG, JPEG, GIF). SVG non ha magic bytes e viene
//! riconosciuto da estensione o dal prefisso testuale `<svg` / `<?xml`.
//! Il content type dichiarato dall'uploader non viene mai usato qui.
//!
//! ## Esempio:
//! ```ignore
//! if let Some(kind) = FileManager::sniff_kind(&path).await? {
//!     let size = FileManager::file_size(&path).await?;
//! }
//! ```

use image::ImageFormat;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use walkdir::WalkDir;

use crate::tool::ImageKind;

/// Bytes read from the head of a file for format detection
const SNIFF_LEN: u64 = 512;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Current size of a file in bytes
    pub async fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Detect the actual image kind of a file from its content
    pub async fn sniff_kind(path: &Path) -> std::io::Result<Option<ImageKind>> {
        let file = fs::File::open(path).await?;
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN).read_to_end(&mut head).await?;

        Ok(Self::kind_from_bytes(&head).or_else(|| Self::svg_kind(path, &head)))
    }

    /// Raster kinds recognised by their magic bytes
    pub fn kind_from_bytes(head: &[u8]) -> Option<ImageKind> {
        match image::guess_format(head).ok()? {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Gif => Some(ImageKind::Gif),
            _ => None,
        }
    }

    fn svg_kind(path: &Path, head: &[u8]) -> Option<ImageKind> {
        let has_svg_extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("svg"))
            .unwrap_or(false);

        let text = String::from_utf8_lossy(head);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        let looks_like_svg =
            text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"));

        if has_svg_extension || looks_like_svg {
            Some(ImageKind::Svg)
        } else {
            None
        }
    }

    /// Content type a browser would declare for this file name
    pub fn declared_type_for(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "gif" => "image/gif",
            "jpg" | "jpeg" | "jpe" => "image/jpeg",
            "png" => "image/png",
            "svg" => "image/svg+xml",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }

    /// Find every regular file under a path (the path itself if it is a file)
    pub fn find_uploads(root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return vec![root.to_path_buf()];
        }

        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
