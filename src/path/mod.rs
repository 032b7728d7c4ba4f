//! Locator parsing, normalization, validation and format checks.
//!
//! These are the pure stages of the pipeline. None of them touch the
//! filesystem:
//!
//! - [`ResourceLocator::parse`]: strip `?query`/`#fragment`, classify the scheme
//! - [`normalize`]: decode the scheme into a [`CanonicalPath`]
//! - [`ValidationPolicy::evaluate`]: lenient or strict path-safety rules
//! - [`is_supported`] / [`ImageFormat`]: extension allowlist

mod format;
mod locator;
mod normalize;
mod validate;

pub use format::{ImageFormat, SUPPORTED_EXTENSIONS, extension_of, is_supported};
pub use locator::{ResourceLocator, Scheme, strip_suffixes};
pub use normalize::{CanonicalPath, PathStyle, normalize};
pub use validate::{
    DEFAULT_MAX_PATH_LENGTH, PolicyKind, ReasonCode, ValidationPolicy, ValidationVerdict,
};
