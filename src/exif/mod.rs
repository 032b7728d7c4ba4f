//! Normalized photo metadata.
//!
//! [`MetadataRecord::from_raw`] turns decoder output into a sparse record and
//! derives the human-facing values: f-number and shutter speed from their
//! APEX encodings, GPS coordinates rendered to six decimals.

mod record;

pub use record::{
    BasicInfo, GpsCoordinates, MetadataRecord, f_number, gps_coordinates, shutter_speed,
};
