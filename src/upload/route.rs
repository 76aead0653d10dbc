//! File route definitions and per-file constraints.

use serde::{Deserialize, Serialize};

use crate::config::UploadConfig;
use crate::upload::authorize::UploadRejection;

/// Kind of media a route accepts, matched on the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Any,
}

impl MediaKind {
    pub fn accepts(&self, content_type: &str) -> bool {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match self {
            MediaKind::Image => mime.starts_with("image/"),
            MediaKind::Video => mime.starts_with("video/"),
            MediaKind::Audio => mime.starts_with("audio/"),
            MediaKind::Text => mime.starts_with("text/"),
            MediaKind::Pdf => mime == "application/pdf",
            MediaKind::Any => !mime.is_empty(),
        }
    }
}

/// A file the client intends to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    #[serde(rename = "type", alias = "content_type")]
    pub content_type: String,
}

/// An upload route: what it accepts and how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRoute {
    pub slug: String,
    pub accept: MediaKind,
    pub max_file_size: u64,
    pub max_file_count: usize,
}

impl FileRoute {
    /// Single 4MB image, the profile picture route.
    pub fn media() -> Self {
        Self {
            slug: "media".to_string(),
            accept: MediaKind::Image,
            max_file_size: 4 * 1024 * 1024,
            max_file_count: 1,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            slug: config.slug.clone(),
            accept: config.accept,
            max_file_size: config.max_file_size_bytes,
            max_file_count: config.max_file_count,
        }
    }

    /// Check a batch of files against the route's limits.
    pub fn check(&self, files: &[FileDescriptor]) -> Result<(), UploadRejection> {
        if files.is_empty() {
            return Err(UploadRejection::NoFiles);
        }
        if files.len() > self.max_file_count {
            return Err(UploadRejection::TooManyFiles {
                max: self.max_file_count,
                got: files.len(),
            });
        }
        for file in files {
            if !self.accept.accepts(&file.content_type) {
                return Err(UploadRejection::UnsupportedType {
                    name: file.name.clone(),
                    content_type: file.content_type.clone(),
                });
            }
            if file.size > self.max_file_size {
                return Err(UploadRejection::FileTooLarge {
                    name: file.name.clone(),
                    size: file.size,
                    max: self.max_file_size,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64, content_type: &str) -> FileDescriptor {
        FileDescriptor {
            name: name.into(),
            size,
            content_type: content_type.into(),
        }
    }

    #[test]
    fn test_media_kind_matching() {
        assert!(MediaKind::Image.accepts("image/png"));
        assert!(MediaKind::Image.accepts("IMAGE/JPEG; charset=binary"));
        assert!(!MediaKind::Image.accepts("application/pdf"));
        assert!(MediaKind::Pdf.accepts("application/pdf"));
        assert!(!MediaKind::Any.accepts(""));
    }

    #[test]
    fn test_media_route_accepts_one_small_image() {
        let route = FileRoute::media();
        assert_eq!(route.check(&[file("me.png", 1024, "image/png")]), Ok(()));
        assert_eq!(route.check(&[file("max.png", 4 * 1024 * 1024, "image/png")]), Ok(()));
    }

    #[test]
    fn test_media_route_limits() {
        let route = FileRoute::media();
        assert_eq!(route.check(&[]), Err(UploadRejection::NoFiles));
        assert_eq!(
            route.check(&[file("a.png", 1, "image/png"), file("b.png", 1, "image/png")]),
            Err(UploadRejection::TooManyFiles { max: 1, got: 2 })
        );
        assert_eq!(
            route.check(&[file("big.png", 4 * 1024 * 1024 + 1, "image/png")]),
            Err(UploadRejection::FileTooLarge {
                name: "big.png".into(),
                size: 4 * 1024 * 1024 + 1,
                max: 4 * 1024 * 1024,
            })
        );
        assert!(matches!(
            route.check(&[file("cv.pdf", 10, "application/pdf")]),
            Err(UploadRejection::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_descriptor_wire_name() {
        let f: FileDescriptor = serde_json::from_str(r#"{"name":"a.png","size":3,"type":"image/png"}"#).unwrap();
        assert_eq!(f.content_type, "image/png");
    }
}
