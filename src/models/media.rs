// SPDX-License-Identifier: MIT

//! Media attachments (profile pictures and similar).

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// A media object nested inside another entity's payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    /// Media identifier
    pub id: String,
    /// MIME type of the resource
    pub content_type: String,
    /// Direct URL of the resource
    pub resource_url: String,
    /// Whether this is a Bitmoji avatar
    pub is_bitmoji: bool,
    /// Platform-defined metadata, kept opaque
    #[serde(default)]
    pub metadata: Value,
    /// Map of size variant to URL, kept opaque
    #[serde(default)]
    pub size_urls: Value,
}

impl Media {
    /// Decode a media object from its raw payload.
    pub fn from_value(raw: &Value) -> Result<Self> {
        Media::deserialize(raw).map_err(|e| Error::MalformedEntity(format!("media: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_media() {
        let raw = json!({
            "id": "m-1",
            "content_type": "image/png",
            "resource_url": "https://cdn.example/m-1.png",
            "is_bitmoji": false,
            "metadata": {"width": 256},
            "size_urls": {"small": "https://cdn.example/m-1-s.png"}
        });
        let media = Media::from_value(&raw).unwrap();
        assert_eq!(media.id, "m-1");
        assert!(!media.is_bitmoji);
        assert_eq!(media.metadata["width"], 256);
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let raw = json!({ "id": "m-1", "content_type": "image/png" });
        let err = Media::from_value(&raw).unwrap_err();
        assert!(matches!(err, Error::MalformedEntity(_)));
    }
}
