use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fmt;

/// A base64 `data:` URL holding an entire image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Encode `bytes` as `data:<media_type>;base64,<payload>`.
    pub fn encode(media_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", media_type, BASE64.encode(bytes))
    }

    /// Parse a base64 data URL. Non-base64 data URLs are not supported.
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        let bytes = BASE64.decode(payload.trim()).ok()?;
        Some(Self::new(media_type, bytes))
    }

    /// Usual file extension for the media type.
    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(&self.media_type, &self.bytes))
    }
}
