use serde::Serialize;

/// Extensions the reader accepts, matched as case-insensitive suffixes.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".tiff", ".tif"];

/// Image family of a supported canonical path.
///
/// ```rust
/// use photo_exif::path::ImageFormat;
///
/// assert_eq!(ImageFormat::from_path("/a/PHOTO.JPG"), Some(ImageFormat::Jpeg));
/// assert_eq!(ImageFormat::from_path("scan.tif"), Some(ImageFormat::Tiff));
/// assert_eq!(ImageFormat::from_path("photo.heic"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl ImageFormat {
    /// Detect the format from the path's suffix. Pure, never fails.
    pub fn from_path(path: &str) -> Option<Self> {
        let lower = path.to_lowercase();
        let ext = SUPPORTED_EXTENSIONS
            .iter()
            .find(|ext| lower.ends_with(*ext))?;
        match *ext {
            ".jpg" | ".jpeg" => Some(Self::Jpeg),
            ".png" => Some(Self::Png),
            ".webp" => Some(Self::WebP),
            _ => Some(Self::Tiff),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }
}

/// Whether `path` ends in one of [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &str) -> bool {
    ImageFormat::from_path(path).is_some()
}

/// The text from the last `.` of the final path component, for diagnostics.
pub fn extension_of(path: &str) -> Option<&str> {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    base.rfind('.').map(|idx| &base[idx..])
}
