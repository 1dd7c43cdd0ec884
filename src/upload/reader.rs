use super::{BlobSource, DataUrl, FileBlob};
use crate::error::GalleryError;

/// Reads uploaded files into self-contained `data:` URLs.
///
/// Each read is independent, so a batch can have all of its reads in flight
/// at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReader;

impl FileReader {
    pub fn new() -> Self {
        Self
    }

    pub async fn read_as_data_url(&self, file: &FileBlob) -> Result<String, GalleryError> {
        let read_error = |reason: String| GalleryError::FileReadError {
            name: file.name.clone(),
            reason,
        };

        let url = match &file.source {
            BlobSource::Memory(bytes) => DataUrl::encode(&file.media_type, bytes),
            BlobSource::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| read_error(format!("{}: {}", path.display(), e)))?;
                let media_type = file.media_type.clone();
                tokio::task::spawn_blocking(move || DataUrl::encode(&media_type, &bytes))
                    .await
                    .map_err(|e| read_error(e.to_string()))?
            }
        };

        tracing::debug!(name = %file.name, bytes = file.size, "Read file");
        Ok(url)
    }
}
