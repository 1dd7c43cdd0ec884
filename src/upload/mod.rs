//! Incoming files: what a picker or drop hands us, how they are validated
//! and how they are turned into self-contained image URLs.

pub mod data_url;
pub mod discovery;
pub mod progress;
pub mod reader;

use std::path::PathBuf;

pub use data_url::DataUrl;
pub use discovery::discover_files;
pub use progress::UploadProgress;
pub use reader::FileReader;

use crate::error::GalleryError;

/// Image types accepted for upload by default.
pub const DEFAULT_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

pub const MIB: u64 = 1024 * 1024;

/// A size limit as shown to users: whole or fractional megabytes, or
/// kilobytes below one megabyte.
pub fn format_limit(bytes: u64) -> String {
    if bytes >= MIB {
        if bytes % MIB == 0 {
            format!("{}MB", bytes / MIB)
        } else {
            format!("{:.1}MB", bytes as f64 / MIB as f64)
        }
    } else if bytes >= 1024 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Where a file's bytes come from.
#[derive(Debug, Clone)]
pub enum BlobSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// A file as supplied by a picker or drop: declared name, media type and
/// size, plus a way to read its contents.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub source: BlobSource,
}

impl FileBlob {
    pub fn from_bytes(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            source: BlobSource::Memory(bytes),
        }
    }

    /// Describe a file on disk. The media type is guessed from the
    /// extension, the way a browser fills in `File.type`.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let media_type = media_type_for_name(&name).unwrap_or_default().to_string();

        Ok(Self {
            name,
            media_type,
            size,
            source: BlobSource::Path(path),
        })
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Media type for a file name based on its extension.
pub fn media_type_for_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_lowercase();
    let media_type = match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "avif" => "image/avif",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(media_type)
}

/// Type and size limits for one kind of upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_types: Vec<String>,
    pub max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(accepted_types: Vec<String>, max_bytes: u64) -> Self {
        Self {
            accepted_types,
            max_bytes,
        }
    }

    /// Default gallery policy: common web image types up to 5 MiB.
    pub fn gallery() -> Self {
        Self::new(default_image_types(), 5 * MIB)
    }

    /// Default profile photo policy: common web image types up to 2 MiB.
    pub fn profile() -> Self {
        Self::new(default_image_types(), 2 * MIB)
    }

    /// Check a single file. The type is checked before the size.
    pub fn check(&self, file: &FileBlob) -> Result<(), GalleryError> {
        if !self.accepted_types.iter().any(|t| t == &file.media_type) {
            return Err(GalleryError::InvalidFileType {
                name: file.name.clone(),
                media_type: file.media_type.clone(),
            });
        }
        if file.size > self.max_bytes {
            return Err(GalleryError::FileTooLarge {
                name: file.name.clone(),
                size: file.size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Split a batch into files that pass and files that don't, keeping
    /// submission order on both sides.
    pub fn partition(&self, files: Vec<FileBlob>) -> (Vec<FileBlob>, Vec<(FileBlob, GalleryError)>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for file in files {
            match self.check(&file) {
                Ok(()) => accepted.push(file),
                Err(e) => rejected.push((file, e)),
            }
        }
        (accepted, rejected)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::gallery()
    }
}

pub fn default_image_types() -> Vec<String> {
    DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect()
}
