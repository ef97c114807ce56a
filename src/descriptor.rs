//! Uploaded-file descriptor exchanged with the host.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Declared content types accepted for optimization
pub const SUPPORTED_TYPES: [&str; 3] = ["image/gif", "image/jpeg", "image/png"];

/// An uploaded file as the host sees it.
///
/// `declared_type` comes from the uploading client and is only ever used to
/// decide eligibility. `size` is advisory and is overwritten after a
/// successful transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: Option<PathBuf>,
    pub declared_type: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(path: impl Into<PathBuf>, declared_type: impl Into<String>, size: u64) -> Self {
        Self {
            path: Some(path.into()),
            declared_type: declared_type.into(),
            size,
        }
    }

    /// Descriptor for an upload the host could not place on disk
    pub fn without_path(declared_type: impl Into<String>, size: u64) -> Self {
        Self {
            path: None,
            declared_type: declared_type.into(),
            size,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_eligible(&self) -> bool {
        SUPPORTED_TYPES.contains(&self.declared_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_is_exact() {
        assert!(FileDescriptor::new("/tmp/a.gif", "image/gif", 1).is_eligible());
        assert!(FileDescriptor::new("/tmp/a.jpg", "image/jpeg", 1).is_eligible());
        assert!(FileDescriptor::without_path("image/png", 1).is_eligible());

        for declared in ["image/svg+xml", "image/webp", "IMAGE/PNG", "image/jpg", "text/plain"] {
            assert!(!FileDescriptor::new("/tmp/x", declared, 1).is_eligible(), "{declared}");
        }
    }

    #[test]
    fn test_json_shape() {
        let descriptor: FileDescriptor = serde_json::from_str(
            r#"{"path": "/tmp/a.png", "declared_type": "image/png", "size": 2048}"#,
        )
        .unwrap();
        assert_eq!(descriptor, FileDescriptor::new("/tmp/a.png", "image/png", 2048));

        let missing: FileDescriptor =
            serde_json::from_str(r#"{"path": null, "declared_type": "image/png", "size": 1}"#)
                .unwrap();
        assert!(missing.path().is_none());
    }
}
