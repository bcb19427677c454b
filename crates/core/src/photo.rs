//! Photo cell references.
//!
//! A photo cell holds one of:
//! - `idb:<id>`: blob in the local photo store
//! - `supa:<path>`: object in the remote bucket
//! - `data:<mime>;base64,...`: legacy inline image
//! - anything else: an external URL shown as-is

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::{CoreError, Result};
use crate::id::create_id;

const LOCAL_PREFIX: &str = "idb:";
const REMOTE_PREFIX: &str = "supa:";
const INLINE_PREFIX: &str = "data:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoRef<'a> {
    Local(&'a str),
    Remote(&'a str),
    Inline(&'a str),
    External(&'a str),
}

impl<'a> PhotoRef<'a> {
    /// Classify a cell value; blank cells hold no photo.
    pub fn parse(value: &'a str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        if let Some(id) = value.strip_prefix(LOCAL_PREFIX) {
            return Some(Self::Local(id));
        }
        if let Some(path) = value.strip_prefix(REMOTE_PREFIX) {
            return Some(Self::Remote(path));
        }
        if value.starts_with(INLINE_PREFIX) {
            return Some(Self::Inline(value));
        }
        Some(Self::External(value))
    }

    /// Needs uploading before other devices can see it.
    pub fn is_device_only(&self) -> bool {
        matches!(self, Self::Local(_) | Self::Inline(_))
    }
}

pub fn local_ref(photo_id: &str) -> String {
    format!("{LOCAL_PREFIX}{photo_id}")
}

pub fn remote_ref(path: &str) -> String {
    format!("{REMOTE_PREFIX}{path}")
}

/// Bucket path for a migrated photo: `<user>/<uuid>.<ext>`.
pub fn photo_object_path(user_id: &str, extension: &str) -> String {
    format!("{user_id}/{}.{extension}", create_id())
}

/// Bucket path for a tab logo: `<user>/tab-logos/<uuid>.<ext>`.
pub fn logo_object_path(user_id: &str, extension: &str) -> String {
    format!("{user_id}/tab-logos/{}.{extension}", create_id())
}

pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_lowercase().as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "jpg",
    }
}

/// Image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<ImageBlob> {
    let rest = url
        .strip_prefix(INLINE_PREFIX)
        .ok_or_else(|| CoreError::InvalidInput("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::InvalidInput("data URL has no payload".into()))?;
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(CoreError::InvalidInput("only base64 data URLs are supported".into()));
    };
    let bytes = B64
        .decode(payload.trim())
        .map_err(|e| CoreError::InvalidInput(format!("Failed to decode base64: {e}")))?;
    let content_type = if mime.is_empty() { "image/jpeg".to_owned() } else { mime.to_owned() };
    Ok(ImageBlob { content_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refs() {
        assert_eq!(PhotoRef::parse(""), None);
        assert_eq!(PhotoRef::parse("idb:abc"), Some(PhotoRef::Local("abc")));
        assert_eq!(PhotoRef::parse("supa:u/1.jpg"), Some(PhotoRef::Remote("u/1.jpg")));
        assert!(PhotoRef::parse("data:image/png;base64,AA==").unwrap().is_device_only());
        assert!(!PhotoRef::parse("https://x/y.jpg").unwrap().is_device_only());
    }

    #[test]
    fn test_decode_data_url() {
        let blob = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.bytes, b"hello");
        assert_eq!(extension_for(&blob.content_type), "png");
        assert!(decode_data_url("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_object_paths() {
        let path = photo_object_path("user-1", "jpg");
        assert!(path.starts_with("user-1/") && path.ends_with(".jpg"));
        assert!(logo_object_path("user-1", "png").starts_with("user-1/tab-logos/"));
    }
}
