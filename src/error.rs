use thiserror::Error;

use crate::decoder::{AccessFailure, DecodeError};
use crate::path::ReasonCode;

/// Why a metadata read produced no record.
///
/// Every stage of the read pipeline that can refuse an input maps to exactly
/// one variant. Callers that only need a yes/no can treat any `Err` as the
/// "no data" state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("malformed app:// locator: {path}")]
    MalformedScheme { path: String },

    #[error("path traversal rejected: {path}")]
    Traversal { path: String },

    #[error("system path rejected: {path}")]
    DenylistedPath { path: String },

    #[error("path too long ({length} chars): {path}")]
    PathTooLong { path: String, length: usize },

    #[error("suspicious pattern in path: {path}")]
    SuspiciousPattern { path: String },

    #[error("hidden root-level file rejected: {path}")]
    HiddenRootFile { path: String },

    #[error("unsupported image format: {path}")]
    UnsupportedFormat { path: String },

    #[error("file {failure}: {path}")]
    NotFound { path: String, failure: AccessFailure },

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("no metadata found in {path}")]
    EmptyMetadata { path: String },
}

impl ReadError {
    /// Stable machine-readable code, used in logs and JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedScheme { .. } => "MALFORMED_SCHEME",
            Self::Traversal { .. } => "TRAVERSAL",
            Self::DenylistedPath { .. } => "DENYLISTED_PATH",
            Self::PathTooLong { .. } => "PATH_TOO_LONG",
            Self::SuspiciousPattern { .. } => "SUSPICIOUS_PATTERN",
            Self::HiddenRootFile { .. } => "HIDDEN_ROOT_FILE",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Decode(_) => "DECODE_ERROR",
            Self::EmptyMetadata { .. } => "EMPTY_METADATA",
        }
    }

    /// The error for a rejected validation verdict. `None` for
    /// [`ReasonCode::Ok`].
    pub fn from_reason(reason: ReasonCode, path: &str) -> Option<Self> {
        let path = path.to_string();
        Some(match reason {
            ReasonCode::Ok => return None,
            ReasonCode::Traversal => Self::Traversal { path },
            ReasonCode::DenylistedSystemPath => Self::DenylistedPath { path },
            ReasonCode::TooLong => {
                let length = path.chars().count();
                Self::PathTooLong { path, length }
            }
            ReasonCode::SuspiciousPattern => Self::SuspiciousPattern { path },
            ReasonCode::HiddenRootFile => Self::HiddenRootFile { path },
            ReasonCode::MalformedScheme => Self::MalformedScheme { path },
        })
    }

    /// `true` for refusals made before the decoder ran.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Decode(_) | Self::EmptyMetadata { .. })
    }
}
