use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SOURCE_IMAGE_FIELD: &str = "sourceImage";
pub const TARGET_VIDEO_FIELD: &str = "targetVideo";

const ALLOWED_IMAGE: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const ALLOWED_VIDEO: [&str; 3] = ["video/mp4", "video/quicktime", "video/webm"];

/// Content type assumed for parts that declare none.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// The two named file slots of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    SourceImage,
    TargetVideo,
}

impl MediaSlot {
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            SOURCE_IMAGE_FIELD => Some(Self::SourceImage),
            TARGET_VIDEO_FIELD => Some(Self::TargetVideo),
            _ => None,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Self::SourceImage => SOURCE_IMAGE_FIELD,
            Self::TargetVideo => TARGET_VIDEO_FIELD,
        }
    }

    /// Allow-list check on an already normalized MIME type
    pub fn accepts(self, mime: &str) -> bool {
        match self {
            Self::SourceImage => ALLOWED_IMAGE.contains(&mime),
            Self::TargetVideo => ALLOWED_VIDEO.contains(&mime),
        }
    }
}

/// Strip parameters and lowercase (`"Image/PNG; q=1"` -> `"image/png"`).
pub fn normalize_mime(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_MIME)
        .to_ascii_lowercase()
}

/// A file accepted and written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub path: String,
}

impl StoredFile {
    pub fn new(filename: String, mimetype: String, size: u64, path: &Path) -> Self {
        Self {
            filename,
            mimetype,
            size,
            path: path.display().to_string(),
        }
    }
}
