use serde::Serialize;

/// Prefix of host-application resource URLs (`app://<id>/<path>`).
pub const APP_PREFIX: &str = "app://";
/// Prefix of `file://` URLs.
pub const FILE_PREFIX: &str = "file://";

/// How a raw locator string addresses its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// `app://<opaque-id>/<path>`: resolved by the host into an absolute path.
    App,
    /// `file://<platform-path>`
    File,
    /// Anything else, taken as a filesystem path.
    Plain,
}

/// A caller-supplied image identifier, classified by scheme.
///
/// The query string and fragment are stripped before classification, so
/// `photo.jpg?t=1#s` and `photo.jpg` produce identical locators apart from
/// [`raw`](Self::raw).
///
/// ```rust
/// use photo_exif::path::{ResourceLocator, Scheme};
///
/// let loc = ResourceLocator::parse("app://abc123/Users/a/0.jpeg?1759560592036");
/// assert_eq!(loc.scheme(), Scheme::App);
/// assert_eq!(loc.cleaned(), "app://abc123/Users/a/0.jpeg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    raw: String,
    cleaned: String,
    scheme: Scheme,
}

impl ResourceLocator {
    pub fn parse(raw: &str) -> Self {
        let cleaned = strip_suffixes(raw);
        let scheme = if cleaned.starts_with(APP_PREFIX) {
            Scheme::App
        } else if cleaned.starts_with(FILE_PREFIX) {
            Scheme::File
        } else {
            Scheme::Plain
        };

        log::debug!("Locator {raw:?} classified as {scheme:?}");

        Self {
            raw: raw.to_string(),
            cleaned: cleaned.to_string(),
            scheme,
        }
    }

    /// The string exactly as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The raw string with `?query` and `#fragment` removed.
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }
}

/// Remove everything from the first `?`, then everything from the first `#`
/// of what remains.
pub fn strip_suffixes(raw: &str) -> &str {
    let without_query = match raw.find('?') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    match without_query.find('#') {
        Some(idx) => &without_query[..idx],
        None => without_query,
    }
}
