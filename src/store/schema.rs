//! On-storage layout of the gallery collection.
//!
//! Current layout is `{"version": 1, "photos": [...]}`. The bare array
//! written before versioning is still read and gets upgraded on the next
//! write.

use serde::Serialize;
use serde_json::Value;

use super::PhotoRecord;
use crate::error::{GalleryError, Result};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredGallery<'a> {
    version: u32,
    photos: &'a [PhotoRecord],
}

/// A decoded collection and whether it came from an older layout.
#[derive(Debug)]
pub struct Decoded {
    pub photos: Vec<PhotoRecord>,
    pub migrated_from: Option<u32>,
}

pub fn encode(photos: &[PhotoRecord]) -> serde_json::Result<String> {
    serde_json::to_string(&StoredGallery {
        version: SCHEMA_VERSION,
        photos,
    })
}

pub fn decode(key: &str, raw: &str) -> Result<Decoded> {
    let malformed = |reason: String| GalleryError::MalformedStoredData {
        key: key.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;

    match value {
        Value::Array(_) => {
            let photos = serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
            Ok(Decoded {
                photos,
                migrated_from: Some(0),
            })
        }
        Value::Object(mut map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| malformed("missing schema version".to_string()))?;
            let version = u32::try_from(version)
                .map_err(|_| malformed(format!("schema version {} out of range", version)))?;

            if version > SCHEMA_VERSION {
                return Err(GalleryError::UnsupportedSchemaVersion {
                    key: key.to_string(),
                    found: version,
                    supported: SCHEMA_VERSION,
                });
            }
            if version == 0 {
                return Err(malformed("schema version 0 is only valid as a bare array".to_string()));
            }

            let photos = map
                .remove("photos")
                .ok_or_else(|| malformed("missing photos".to_string()))?;
            let photos = serde_json::from_value(photos).map_err(|e| malformed(e.to_string()))?;
            Ok(Decoded {
                photos,
                migrated_from: None,
            })
        }
        other => Err(malformed(format!("expected an object or array, found {}", kind(&other)))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Category, PhotoId};

    const LEGACY: &str = r#"[
        {"id": 1700000000000, "url": "data:image/png;base64,AA==", "title": "a",
         "description": "Uploaded on 1/1/2024", "category": "travel",
         "date": "2024-01-01T10:00:00.000Z"},
        {"id": "1700000000001", "url": "data:image/png;base64,AA==", "title": "b",
         "description": "", "category": "wedding",
         "date": "2024-01-01T10:00:00.000Z"}
    ]"#;

    #[test]
    fn test_legacy_array_is_migrated() {
        let decoded = decode("galleryPhotos", LEGACY).unwrap();
        assert_eq!(decoded.migrated_from, Some(0));
        assert_eq!(decoded.photos.len(), 2);
        assert_eq!(decoded.photos[1].id, PhotoId(1_700_000_000_001));
        assert_eq!(decoded.photos[1].category, Category::Other("wedding".to_string()));
    }

    #[test]
    fn test_encode_then_decode_is_current_version() {
        let legacy = decode("galleryPhotos", LEGACY).unwrap().photos;
        let raw = encode(&legacy).unwrap();
        assert!(raw.starts_with("{\"version\":1,"));

        let decoded = decode("galleryPhotos", &raw).unwrap();
        assert_eq!(decoded.migrated_from, None);
        assert_eq!(decoded.photos, legacy);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = decode("galleryPhotos", r#"{"version": 7, "items": []}"#).unwrap_err();
        assert_eq!(
            err,
            GalleryError::UnsupportedSchemaVersion {
                key: "galleryPhotos".to_string(),
                found: 7,
                supported: SCHEMA_VERSION,
            }
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        for raw in ["not json", "null", "42", r#"{"photos": []}"#, r#"[{"id": 1}]"#] {
            let err = decode("galleryPhotos", raw).unwrap_err();
            assert!(
                matches!(err, GalleryError::MalformedStoredData { .. }),
                "{} gave {:?}",
                raw,
                err
            );
        }
    }
}
