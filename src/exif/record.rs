use chrono::NaiveDateTime;
use serde::Serialize;

use crate::decoder::{Field, RawMetadata};

const TIMESTAMP_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// Photo metadata normalized from one decoder result.
///
/// Every field is `Option`: a field is present only when the decoder returned
/// a value for it. Derived display fields (`f_number`, `shutter_speed`, `gps`)
/// exist only when their source value does.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,

    /// Aperture in APEX units, as stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture_value: Option<f64>,
    /// `2^(aperture/2)` to one decimal, e.g. `"4.0"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_number: Option<String>,
    /// Shutter speed in APEX units, as stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed_value: Option<f64>,
    /// Exposure time, e.g. `1/64"` or `2"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    /// Millimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsCoordinates>,
    /// Metres; negative below sea level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_altitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

/// Signed decimal degrees rendered with six decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsCoordinates {
    pub latitude: String,
    pub longitude: String,
}

impl MetadataRecord {
    /// Normalize decoder output. Values of the wrong shape are dropped.
    pub fn from_raw(raw: &RawMetadata) -> Self {
        let text = |f: Field| raw.get(&f).and_then(|v| v.as_text()).map(str::to_string);
        let number = |f: Field| raw.get(&f).and_then(|v| v.as_f64());
        let timestamp = |f: Field| raw.get(&f).and_then(|v| v.as_timestamp());

        let aperture_value = number(Field::ApertureValue);
        let shutter_speed_value = number(Field::ShutterSpeedValue);

        Self {
            date_time_original: timestamp(Field::DateTimeOriginal),
            create_date: timestamp(Field::CreateDate),
            make: text(Field::Make),
            model: text(Field::Model),
            lens_model: text(Field::LensModel),
            aperture_value,
            f_number: aperture_value.map(f_number),
            shutter_speed_value,
            shutter_speed: shutter_speed_value.map(shutter_speed),
            iso: number(Field::Iso).and_then(to_u32),
            focal_length: number(Field::FocalLength),
            gps: gps_coordinates(number(Field::Latitude), number(Field::Longitude)),
            gps_altitude: number(Field::GpsAltitude),
            image_width: number(Field::ImageWidth).and_then(to_u32),
            image_height: number(Field::ImageHeight).and_then(to_u32),
            orientation: number(Field::Orientation)
                .and_then(to_u32)
                .and_then(|o| u16::try_from(o).ok()),
            software: text(Field::Software),
            artist: text(Field::Artist),
            copyright: text(Field::Copyright),
        }
    }

    /// `true` when no field at all is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Labelled, human-readable rows for every present field, in display order.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();

        if let Some(t) = self.date_time_original {
            rows.push(("Date taken", t.format(TIMESTAMP_DISPLAY).to_string()));
        }
        if let Some(t) = self.create_date {
            rows.push(("Date created", t.format(TIMESTAMP_DISPLAY).to_string()));
        }
        if self.make.is_some() || self.model.is_some() {
            let camera = format!(
                "{} {}",
                self.make.as_deref().unwrap_or_default(),
                self.model.as_deref().unwrap_or_default()
            );
            rows.push(("Camera", camera.trim().to_string()));
        }
        if let Some(ref lens) = self.lens_model {
            rows.push(("Lens", lens.clone()));
        }
        if let Some(ref f) = self.f_number {
            rows.push(("Aperture", format!("f/{f}")));
        }
        if let Some(ref s) = self.shutter_speed {
            rows.push(("Shutter speed", s.clone()));
        }
        if let Some(iso) = self.iso {
            rows.push(("ISO", iso.to_string()));
        }
        if let Some(mm) = self.focal_length {
            rows.push(("Focal length", format!("{mm}mm")));
        }
        if let Some(ref gps) = self.gps {
            rows.push(("GPS", format!("{}, {}", gps.latitude, gps.longitude)));
        }
        if let Some(m) = self.gps_altitude {
            rows.push(("Altitude", format!("{m}m")));
        }
        if let (Some(w), Some(h)) = (self.image_width, self.image_height) {
            rows.push(("Dimensions", format!("{w} × {h}")));
        }
        if let Some(o) = self.orientation {
            rows.push(("Orientation", o.to_string()));
        }
        if let Some(ref s) = self.software {
            rows.push(("Software", s.clone()));
        }
        if let Some(ref a) = self.artist {
            rows.push(("Artist", a.clone()));
        }
        if let Some(ref c) = self.copyright {
            rows.push(("Copyright", c.clone()));
        }

        rows
    }
}

/// Dimensions and orientation from a basic-field read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasicInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u16>,
    /// The basic read succeeded, even if it returned nothing.
    pub has_basic_exif: bool,
}

impl BasicInfo {
    pub fn from_raw(raw: &RawMetadata) -> Self {
        let rec = MetadataRecord::from_raw(raw);
        Self {
            width: rec.image_width,
            height: rec.image_height,
            orientation: rec.orientation,
            has_basic_exif: true,
        }
    }

    /// Nothing could be read.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// APEX aperture value to f-number, one decimal place.
pub fn f_number(aperture_apex: f64) -> String {
    format!("{:.1}", 2f64.powf(aperture_apex / 2.0))
}

/// APEX shutter speed value to an exposure-time string.
///
/// Exposures of a second or longer render as seconds (`2"`); shorter ones as
/// a reciprocal (`1/64"`).
pub fn shutter_speed(shutter_apex: f64) -> String {
    let seconds = 1.0 / 2f64.powf(shutter_apex);
    if seconds >= 1.0 {
        format!("{seconds}\"")
    } else {
        format!("1/{}\"", (1.0 / seconds).round())
    }
}

/// Both coordinates or nothing.
pub fn gps_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<GpsCoordinates> {
    let (lat, lon) = (latitude?, longitude?);
    Some(GpsCoordinates {
        latitude: format!("{lat:.6}"),
        longitude: format!("{lon:.6}"),
    })
}

fn to_u32(n: f64) -> Option<u32> {
    if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 {
        Some(n.round() as u32)
    } else {
        None
    }
}
