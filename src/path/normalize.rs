use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use super::locator::{APP_PREFIX, FILE_PREFIX, ResourceLocator, Scheme};

/// Absolute-path convention of the host platform.
///
/// Only matters for `file://` URLs: `file:///C:/photo.jpg` must lose its
/// leading slash on drive-letter platforms, but `file:///home/a.jpg` must keep
/// it on POSIX ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    Posix,
    DriveLetter,
}

impl PathStyle {
    /// The style of the platform this binary was built for.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::DriveLetter
        } else {
            Self::Posix
        }
    }
}

/// A decoded, query/fragment-free local path derived from one locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPath {
    path: String,
    malformed_scheme: bool,
}

impl CanonicalPath {
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// `true` when an `app://` locator had no `/` after its identifier and was
    /// passed through unchanged.
    pub fn is_malformed_scheme(&self) -> bool {
        self.malformed_scheme
    }
}

impl std::fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Convert a parsed locator into a canonical local path.
///
/// Never fails: undecodable input is passed through so validation always has
/// a defined string to inspect.
///
/// ```rust
/// use photo_exif::path::{normalize, PathStyle, ResourceLocator};
///
/// let loc = ResourceLocator::parse("app://8cf4920c/Users/a/My%20Vault/0.jpeg?123");
/// let path = normalize(&loc, PathStyle::Posix);
/// assert_eq!(path.as_str(), "/Users/a/My Vault/0.jpeg");
/// ```
pub fn normalize(locator: &ResourceLocator, style: PathStyle) -> CanonicalPath {
    let cleaned = locator.cleaned();

    match locator.scheme() {
        Scheme::App => {
            let body = &cleaned[APP_PREFIX.len()..];
            match body.find('/') {
                Some(slash) => {
                    log::debug!("app:// identifier {:?} discarded", &body[..slash]);
                    CanonicalPath {
                        path: percent_decode_or_keep(&body[slash..]),
                        malformed_scheme: false,
                    }
                }
                None => {
                    log::warn!("Malformed app:// locator (no path after identifier): {cleaned}");
                    CanonicalPath {
                        path: cleaned.to_string(),
                        malformed_scheme: true,
                    }
                }
            }
        }
        Scheme::File => {
            let mut body = &cleaned[FILE_PREFIX.len()..];
            if style == PathStyle::DriveLetter {
                body = body.strip_prefix('/').unwrap_or(body);
            }
            CanonicalPath {
                path: percent_decode_or_keep(body),
                malformed_scheme: false,
            }
        }
        Scheme::Plain => CanonicalPath {
            path: cleaned.to_string(),
            malformed_scheme: false,
        },
    }
}

/// Percent-decode `encoded`, or return it unchanged when it holds a broken
/// escape or decodes to invalid UTF-8.
fn percent_decode_or_keep(encoded: &str) -> String {
    if !has_well_formed_escapes(encoded) {
        log::warn!("Malformed percent-encoding, using undecoded path: {encoded}");
        return encoded.to_string();
    }
    match percent_decode_str(encoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::warn!("Percent-decoded path is not UTF-8 ({e}), using undecoded path: {encoded}");
            encoded.to_string()
        }
    }
}

/// Every `%` must be followed by two hex digits.
fn has_well_formed_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            match hex {
                Some(pair) if pair.iter().all(u8::is_ascii_hexdigit) => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}
