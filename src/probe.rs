//! Reachability check through the decoder rather than filesystem calls.
//!
//! Sandboxed hosts may not allow `stat`, but they always let the metadata
//! decoder open files, so existence is probed with a zero-field decode.
//!
//! The outcome is deliberately asymmetric:
//!
//! - a probe error recognizably meaning "not found" or "access denied" is
//!   final: the file is reported missing (fail closed);
//! - any other probe error is treated as the file existing (fail open), so a
//!   decoder that is merely strict about an unusual file does not hide it.

use serde::Serialize;

use crate::decoder::{AccessFailure, DecodeError, MetadataDecoder};

/// Result of probing one canonical path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Existence {
    /// The probe succeeded.
    Confirmed,
    /// The probe failed for a reason unrelated to file access.
    Assumed { error: String },
    /// The file cannot be reached.
    Missing { failure: AccessFailure },
}

impl Existence {
    pub fn exists(&self) -> bool {
        !matches!(self, Self::Missing { .. })
    }
}

/// Probe `path` with a zero-field decode and classify the outcome.
pub async fn probe(decoder: &dyn MetadataDecoder, path: &str) -> Existence {
    match decoder.decode(path, &[]).await {
        Ok(_) => {
            log::debug!("Existence confirmed by {}: {path}", decoder.name());
            Existence::Confirmed
        }
        Err(err) => classify(path, &err),
    }
}

fn classify(path: &str, err: &DecodeError) -> Existence {
    match err.access_failure() {
        Some(failure) => {
            log::error!("File {failure}: {path} ({err})");
            Existence::Missing { failure }
        }
        None => {
            log::warn!("Existence probe warning for {path}: {err}; treating file as present");
            Existence::Assumed { error: err.to_string() }
        }
    }
}
