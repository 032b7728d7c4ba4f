use nom_exif::{EntryValue, Exif, ExifIter, LatLng, MediaParser, MediaSource};

use super::{
    DecodeError, Field, FieldKind, MetadataDecoder, RawMetadata, RawValue, parse_timestamp,
};

/// [`MetadataDecoder`] backed by nom-exif.
///
/// File access runs on tokio's blocking pool. A zero-field request only opens
/// the file, which is enough to tell a missing or unreadable file apart from
/// one that merely has no metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NomExifDecoder;

impl NomExifDecoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MetadataDecoder for NomExifDecoder {
    fn name(&self) -> &str {
        "nom-exif"
    }

    async fn decode(&self, path: &str, fields: &[Field]) -> Result<RawMetadata, DecodeError> {
        let owned_path = path.to_string();
        let fields = fields.to_vec();
        tokio::task::spawn_blocking(move || decode_file(&owned_path, &fields))
            .await
            .map_err(|e| DecodeError::Other(format!("decoder task failed: {e}")))?
    }
}

fn decode_file(path: &str, fields: &[Field]) -> Result<RawMetadata, DecodeError> {
    // Opening first yields a typed io error for missing or unreadable files.
    std::fs::File::open(path).map_err(|e| DecodeError::from_io(path, &e))?;

    if fields.is_empty() {
        return Ok(RawMetadata::new());
    }

    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(e) if is_exif_missing(&e) => {
            log::debug!("No EXIF data found in {path}");
            return Ok(RawMetadata::new());
        }
        Err(e) => return Err(DecodeError::Malformed(e.to_string())),
    };

    // Parse GPS info before converting to Exif (consumes the iterator)
    let gps_info = if fields.iter().any(Field::is_gps) {
        iter.parse_gps_info().ok().flatten()
    } else {
        None
    };
    let exif: Exif = iter.into();

    let (latitude, longitude, altitude) = match &gps_info {
        Some(gps) => (
            latlng_to_decimal(&gps.latitude, gps.latitude_ref),
            latlng_to_decimal(&gps.longitude, gps.longitude_ref),
            ratio(gps.altitude.0 as f64, gps.altitude.1 as f64)
                .map(|m| if gps.altitude_ref == 1 { -m } else { m }),
        ),
        None => (None, None, None),
    };

    let mut out = RawMetadata::new();
    for &field in fields {
        let value = match field {
            Field::Latitude => latitude.map(RawValue::Number),
            Field::Longitude => longitude.map(RawValue::Number),
            Field::GpsAltitude => altitude.map(RawValue::Number),
            _ => field
                .tag_codes()
                .iter()
                .find_map(|&code| exif.get_by_ifd_tag_code(0, code))
                .and_then(|val| entry_to_raw(field.kind(), val)),
        };
        if let Some(value) = value {
            out.insert(field, value);
        }
    }

    log::debug!("nom-exif decoded {}/{} fields from {path}", out.len(), fields.len());
    Ok(out)
}

/// nom-exif reports a readable image without an Exif block as a parse
/// failure; that image simply has nothing to decode.
fn is_exif_missing(e: &nom_exif::Error) -> bool {
    matches!(e, nom_exif::Error::ParseFailed(inner) if inner.to_string() == EXIF_NOT_FOUND)
}

const EXIF_NOT_FOUND: &str = "Exif not found";

fn entry_to_raw(kind: FieldKind, val: &EntryValue) -> Option<RawValue> {
    match kind {
        FieldKind::Text => entry_to_string(val).map(RawValue::Text),
        FieldKind::Number => entry_to_f64(val).map(RawValue::Number),
        FieldKind::Timestamp => match val {
            EntryValue::Time(t) => Some(RawValue::Timestamp(t.naive_local())),
            EntryValue::NaiveDateTime(t) => Some(RawValue::Timestamp(*t)),
            other => entry_to_string(other)
                .and_then(|s| parse_timestamp(&s))
                .map(RawValue::Timestamp),
        },
    }
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').trim_end_matches('\0').trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

fn entry_to_f64(val: &EntryValue) -> Option<f64> {
    let n = match val {
        EntryValue::URational(r) => ratio(r.0 as f64, r.1 as f64)?,
        EntryValue::IRational(r) => ratio(r.0 as f64, r.1 as f64)?,
        EntryValue::U8(v) => *v as f64,
        EntryValue::U16(v) => *v as f64,
        EntryValue::U32(v) => *v as f64,
        EntryValue::I32(v) => *v as f64,
        EntryValue::F32(v) => *v as f64,
        EntryValue::F64(v) => *v,
        other => first_number(&other.to_string())?,
    };
    n.is_finite().then_some(n)
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 { None } else { Some(num / den) }
}

/// First numeric token of a rendered value such as `[100, 200]` or `28/10`.
fn first_number(s: &str) -> Option<f64> {
    let token = s
        .split(|c: char| c == ',' || c == '[' || c == ']' || c.is_whitespace())
        .map(|t| t.trim_matches('"'))
        .find(|t| !t.is_empty())?;
    match token.split_once('/') {
        Some((num, den)) => ratio(num.parse().ok()?, den.parse().ok()?),
        None => token.parse().ok(),
    }
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to signed decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> Option<f64> {
    let degrees = ratio(latlng.0.0 as f64, latlng.0.1 as f64)?;
    let minutes = ratio(latlng.1.0 as f64, latlng.1.1 as f64)?;
    let seconds = ratio(latlng.2.0 as f64, latlng.2.1 as f64)?;

    let coord = degrees + minutes / 60.0 + seconds / 3600.0;

    if reference == 'S' || reference == 'W' {
        Some(-coord)
    } else {
        Some(coord)
    }
}
