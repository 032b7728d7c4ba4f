mod nom;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod stub;

pub use nom::NomExifDecoder;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// One metadata field on the decoder allowlist.
///
/// Only these fields are ever requested from a decoder; everything else in
/// the image is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    DateTimeOriginal,
    CreateDate,
    Make,
    Model,
    ApertureValue,
    ShutterSpeedValue,
    #[serde(rename = "ISO")]
    Iso,
    FocalLength,
    LensModel,
    #[serde(rename = "latitude")]
    Latitude,
    #[serde(rename = "longitude")]
    Longitude,
    #[serde(rename = "GPSAltitude")]
    GpsAltitude,
    ImageWidth,
    ImageHeight,
    Orientation,
    Software,
    Artist,
    Copyright,
}

/// How a field's raw value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Timestamp,
}

/// Every field the reader asks for.
pub const ALL_FIELDS: &[Field] = &[
    Field::DateTimeOriginal,
    Field::CreateDate,
    Field::Make,
    Field::Model,
    Field::ApertureValue,
    Field::ShutterSpeedValue,
    Field::Iso,
    Field::FocalLength,
    Field::LensModel,
    Field::Latitude,
    Field::Longitude,
    Field::GpsAltitude,
    Field::ImageWidth,
    Field::ImageHeight,
    Field::Orientation,
    Field::Software,
    Field::Artist,
    Field::Copyright,
];

/// Dimensions and orientation only.
pub const BASIC_FIELDS: &[Field] = &[Field::ImageWidth, Field::ImageHeight, Field::Orientation];

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DateTimeOriginal => "DateTimeOriginal",
            Self::CreateDate => "CreateDate",
            Self::Make => "Make",
            Self::Model => "Model",
            Self::ApertureValue => "ApertureValue",
            Self::ShutterSpeedValue => "ShutterSpeedValue",
            Self::Iso => "ISO",
            Self::FocalLength => "FocalLength",
            Self::LensModel => "LensModel",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::GpsAltitude => "GPSAltitude",
            Self::ImageWidth => "ImageWidth",
            Self::ImageHeight => "ImageHeight",
            Self::Orientation => "Orientation",
            Self::Software => "Software",
            Self::Artist => "Artist",
            Self::Copyright => "Copyright",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::DateTimeOriginal | Self::CreateDate => FieldKind::Timestamp,
            Self::Make
            | Self::Model
            | Self::LensModel
            | Self::Software
            | Self::Artist
            | Self::Copyright => FieldKind::Text,
            _ => FieldKind::Number,
        }
    }

    /// EXIF tag codes to look up, in preference order. Empty for the GPS
    /// fields, which come from the decoded GPS block instead.
    pub fn tag_codes(&self) -> &'static [u16] {
        match self {
            Self::DateTimeOriginal => &[0x9003],
            Self::CreateDate => &[0x9004],
            Self::Make => &[0x010F],
            Self::Model => &[0x0110],
            Self::ApertureValue => &[0x9202],
            Self::ShutterSpeedValue => &[0x9201],
            Self::Iso => &[0x8827],
            Self::FocalLength => &[0x920A],
            Self::LensModel => &[0xA434],
            Self::ImageWidth => &[0xA002, 0x0100],
            Self::ImageHeight => &[0xA003, 0x0101],
            Self::Orientation => &[0x0112],
            Self::Software => &[0x0131],
            Self::Artist => &[0x013B],
            Self::Copyright => &[0x8298],
            Self::Latitude | Self::Longitude | Self::GpsAltitude => &[],
        }
    }

    pub fn is_gps(&self) -> bool {
        matches!(self, Self::Latitude | Self::Longitude | Self::GpsAltitude)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single decoded value. Decoders never emit a value for a null or empty
/// field; the key is simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(t) => Some(*t),
            Self::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

/// Decoder output keyed by field.
pub type RawMetadata = BTreeMap<Field, RawValue>;

/// Parse the timestamp spellings EXIF tools produce.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    const FORMATS: &[&str] = &[
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// A file-access failure recognized in a decoder error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessFailure {
    NotFound,
    PermissionDenied,
}

impl std::fmt::Display for AccessFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::PermissionDenied => f.write_str("permission denied"),
        }
    }
}

/// Failure reported by a [`MetadataDecoder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("no such file: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unreadable metadata: {0}")]
    Malformed(String),
    /// An error the decoder could not classify, carried as text.
    #[error("{0}")]
    Other(String),
}

impl DecodeError {
    pub fn from_io(path: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            _ => Self::Other(format!("{path}: {err}")),
        }
    }

    /// Whether this error means the file cannot be reached at all.
    ///
    /// Typed variants answer directly. [`DecodeError::Other`] comes from
    /// decoders that only report text, so it is bucketed by the usual
    /// errno markers; anything unrecognized is not an access failure.
    pub fn access_failure(&self) -> Option<AccessFailure> {
        match self {
            Self::NotFound(_) => Some(AccessFailure::NotFound),
            Self::PermissionDenied(_) => Some(AccessFailure::PermissionDenied),
            Self::Malformed(_) => None,
            Self::Other(msg) => classify_message(msg),
        }
    }
}

fn classify_message(msg: &str) -> Option<AccessFailure> {
    let lower = msg.to_lowercase();
    if lower.contains("enoent") || lower.contains("no such file") {
        Some(AccessFailure::NotFound)
    } else if lower.contains("eacces") || lower.contains("permission denied") {
        Some(AccessFailure::PermissionDenied)
    } else {
        None
    }
}

/// Extracts raw metadata fields from an image.
///
/// Implement this trait to plug in another metadata backend. The crate ships
/// [`NomExifDecoder`]. An empty `fields` slice is a pure reachability probe:
/// the decoder should touch the file and return an empty map.
///
/// # Example
///
/// ```rust,no_run
/// use photo_exif::decoder::{MetadataDecoder, NomExifDecoder, BASIC_FIELDS};
///
/// # async fn example() -> Result<(), photo_exif::decoder::DecodeError> {
/// let decoder = NomExifDecoder::new();
/// let raw = decoder.decode("/photos/0.jpeg", BASIC_FIELDS).await?;
/// println!("{} fields", raw.len());
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait MetadataDecoder: Send + Sync {
    /// The display name of this decoder.
    fn name(&self) -> &str;
    /// Decode `fields` from the image at `path`.
    async fn decode(&self, path: &str, fields: &[Field]) -> Result<RawMetadata, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    // ── Field ────────────────────────────────────────────────────────

    #[test]
    fn all_fields_unique_and_complete() {
        let set: std::collections::BTreeSet<_> = ALL_FIELDS.iter().collect();
        assert_eq!(set.len(), ALL_FIELDS.len());
        assert_eq!(ALL_FIELDS.len(), 18);
        for f in BASIC_FIELDS {
            assert!(ALL_FIELDS.contains(f));
        }
    }

    #[test]
    fn gps_fields_have_no_tag_codes() {
        for f in ALL_FIELDS {
            assert_eq!(f.is_gps(), f.tag_codes().is_empty(), "{f}");
        }
    }

    #[test]
    fn field_names_match_serde() {
        for f in ALL_FIELDS {
            let json = serde_json::to_string(f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
    }

    #[test]
    fn field_kinds() {
        assert_eq!(Field::Make.kind(), FieldKind::Text);
        assert_eq!(Field::CreateDate.kind(), FieldKind::Timestamp);
        assert_eq!(Field::Iso.kind(), FieldKind::Number);
        assert_eq!(Field::Latitude.kind(), FieldKind::Number);
    }

    // ── RawValue ─────────────────────────────────────────────────────

    #[test]
    fn raw_value_numbers() {
        assert_eq!(RawValue::Number(4.0).as_f64(), Some(4.0));
        assert_eq!(RawValue::Text(" 200 ".into()).as_f64(), Some(200.0));
        assert_eq!(RawValue::Number(f64::NAN).as_f64(), None);
        assert_eq!(RawValue::Text("abc".into()).as_f64(), None);
    }

    #[test]
    fn raw_value_text() {
        assert_eq!(RawValue::Text("Canon".into()).as_text(), Some("Canon"));
        assert_eq!(RawValue::Number(1.0).as_text(), None);
    }

    // ── parse_timestamp ──────────────────────────────────────────────

    #[test]
    fn parses_exif_timestamp() {
        let dt = parse_timestamp("2024:01:15 14:30:00").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 30, 0));
    }

    #[test]
    fn parses_rfc3339_keeping_local_time() {
        let dt = parse_timestamp("2023-07-09T20:36:33+08:00").unwrap();
        assert_eq!(dt.hour(), 20);
    }

    #[test]
    fn parses_iso_and_quoted() {
        assert!(parse_timestamp("2024-01-15T14:30:00").is_some());
        assert!(parse_timestamp("\"2024:01:15 14:30:00\"").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    // ── DecodeError ──────────────────────────────────────────────────

    #[test]
    fn typed_access_failures() {
        assert_eq!(DecodeError::NotFound("/a".into()).access_failure(), Some(AccessFailure::NotFound));
        assert_eq!(
            DecodeError::PermissionDenied("/a".into()).access_failure(),
            Some(AccessFailure::PermissionDenied)
        );
        assert_eq!(DecodeError::Malformed("bad".into()).access_failure(), None);
    }

    #[test]
    fn opaque_messages_are_bucketed() {
        let enoent = DecodeError::Other("ENOENT: no such file or directory, open '/x.jpg'".into());
        assert_eq!(enoent.access_failure(), Some(AccessFailure::NotFound));
        let eacces = DecodeError::Other("EACCES: permission denied".into());
        assert_eq!(eacces.access_failure(), Some(AccessFailure::PermissionDenied));
        let other = DecodeError::Other("Unknown file format".into());
        assert_eq!(other.access_failure(), None);
    }

    #[test]
    fn io_errors_map_to_variants() {
        let nf = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(DecodeError::from_io("/a.jpg", &nf), DecodeError::NotFound("/a.jpg".into()));
        let pd = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(
            DecodeError::from_io("/a.jpg", &pd),
            DecodeError::PermissionDenied("/a.jpg".into())
        );
        let other = std::io::Error::other("boom");
        assert!(matches!(DecodeError::from_io("/a.jpg", &other), DecodeError::Other(_)));
    }
}
