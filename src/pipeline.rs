use std::path::Path;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::config::Config;
use crate::decoder::{ALL_FIELDS, BASIC_FIELDS, DecodeError, MetadataDecoder, NomExifDecoder};
use crate::error::ReadError;
use crate::exif::{BasicInfo, MetadataRecord};
use crate::path::{
    CanonicalPath, ImageFormat, PathStyle, PolicyKind, ReasonCode, ResourceLocator, Scheme,
    ValidationPolicy, ValidationVerdict, is_supported, normalize,
};
use crate::probe::{self, Existence};

/// Everything the pure stages learned about one locator.
///
/// Produced by [`Resolver::resolve`]; the read, diagnose and path-debug call
/// sites all start from one of these.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub locator: ResourceLocator,
    pub canonical: CanonicalPath,
    /// The policy the canonical path was checked against.
    pub policy: PolicyKind,
    pub verdict: ValidationVerdict,
    /// `None` when the extension is not on the allowlist.
    pub format: Option<ImageFormat>,
}

impl Resolution {
    pub fn path(&self) -> &str {
        self.canonical.as_str()
    }

    pub fn is_supported(&self) -> bool {
        self.format.is_some()
    }
}

/// Runs locator parsing, normalization, validation and the format check.
///
/// `app://` locators are checked with the lenient policy, since the host
/// hands them out as absolute paths. `file://`, plain, and malformed `app://`
/// locators get the strict one.
///
/// # Example
///
/// ```rust
/// use photo_exif::path::{PathStyle, PolicyKind, ReasonCode};
/// use photo_exif::pipeline::Resolver;
///
/// let resolver = Resolver::new(PathStyle::Posix);
///
/// let res = resolver.resolve("/Users/a/img.jpeg?123456");
/// assert_eq!(res.path(), "/Users/a/img.jpeg");
/// assert_eq!(res.policy, PolicyKind::Strict);
/// assert!(res.verdict.accepted && res.is_supported());
///
/// let res = resolver.resolve("app://abc123/etc/passwd");
/// assert_eq!(res.policy, PolicyKind::Lenient);
/// assert_eq!(res.verdict.reason, ReasonCode::DenylistedSystemPath);
/// ```
#[derive(Debug, Clone)]
pub struct Resolver {
    style: PathStyle,
    lenient: ValidationPolicy,
    strict: ValidationPolicy,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(PathStyle::native())
    }
}

impl Resolver {
    /// Built-in policies with the given path style.
    pub fn new(style: PathStyle) -> Self {
        Self {
            style,
            lenient: ValidationPolicy::lenient(),
            strict: ValidationPolicy::strict(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let v = &config.validation;
        Self {
            style: v.path_style.resolve(),
            lenient: ValidationPolicy::lenient()
                .with_max_length(v.max_path_length)
                .with_extra_denylist(&v.extra_denylist),
            strict: ValidationPolicy::strict()
                .with_max_length(v.max_path_length)
                .with_extra_denylist(&v.extra_denylist),
        }
    }

    pub fn policy(&self, kind: PolicyKind) -> &ValidationPolicy {
        match kind {
            PolicyKind::Lenient => &self.lenient,
            PolicyKind::Strict => &self.strict,
        }
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let locator = ResourceLocator::parse(raw);
        let canonical = normalize(&locator, self.style);

        let rules = if locator.scheme() == Scheme::App && !canonical.is_malformed_scheme() {
            &self.lenient
        } else {
            &self.strict
        };
        let policy = rules.kind();

        let mut verdict = rules.evaluate(canonical.as_str());
        if verdict.accepted && canonical.is_malformed_scheme() {
            log::warn!("Malformed app:// locator has no path: {raw:?}");
            verdict = ValidationVerdict::reject(ReasonCode::MalformedScheme);
        }

        let format = ImageFormat::from_path(canonical.as_str());
        log::debug!(
            "Resolved {raw:?} -> {canonical:?} ({policy:?}, {}, {format:?})",
            verdict.reason
        );

        Resolution { locator, canonical, policy, verdict, format }
    }
}

/// Reads normalized metadata for caller-supplied locators.
///
/// Each read walks the stages in order and stops at the first refusal:
///
/// 1. **Resolve**: parse, normalize and validate the locator ([`Resolver`])
/// 2. **Format**: refuse extensions outside the allowlist
/// 3. **Probe**: zero-field decode to confirm the file is reachable
/// 4. **Decode**: fetch the allowlisted fields and normalize them
///
/// No bytes are read from a path that fails stages 1 or 2. The service is
/// cheap to clone and every clone shares one decoder.
///
/// # Example
///
/// ```rust,no_run
/// use photo_exif::config::Config;
/// use photo_exif::pipeline::ExifService;
///
/// # async fn example() {
/// let service = ExifService::from_config(&Config::default());
///
/// match service.read("app://8cf4920c/Users/a/Photos/0.jpeg?1759560592036").await {
///     Ok(record) => {
///         for (label, value) in record.display_rows() {
///             println!("{label}: {value}");
///         }
///     }
///     Err(e) => println!("No EXIF data ({})", e.code()),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct ExifService {
    decoder: Arc<dyn MetadataDecoder>,
    resolver: Arc<Resolver>,
}

impl ExifService {
    pub fn new(decoder: Arc<dyn MetadataDecoder>, resolver: Resolver) -> Self {
        Self { decoder, resolver: Arc::new(resolver) }
    }

    /// A service backed by [`NomExifDecoder`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(NomExifDecoder::new()), Resolver::from_config(config))
    }

    /// Read one image's metadata.
    ///
    /// An `Err` is the "no data" state; its [`code`](ReadError::code) says
    /// which stage refused.
    pub async fn read(&self, raw: &str) -> Result<MetadataRecord, ReadError> {
        let resolution = self.admit(raw)?;
        let path = resolution.path();

        if let Existence::Missing { failure } = probe::probe(self.decoder.as_ref(), path).await {
            return Err(refused(ReadError::NotFound { path: path.to_string(), failure }));
        }

        let raw_metadata = self
            .decoder
            .decode(path, ALL_FIELDS)
            .await
            .map_err(|e| refused(e.into()))?;

        let record = MetadataRecord::from_raw(&raw_metadata);
        if record.is_empty() {
            return Err(refused(ReadError::EmptyMetadata { path: path.to_string() }));
        }

        log::info!("Read {} fields from {path}", raw_metadata.len());
        Ok(record)
    }

    /// Read several images concurrently.
    ///
    /// Results come back in input order, one per locator; a failure only
    /// affects its own entry.
    pub async fn read_many(&self, raws: &[String]) -> Vec<Result<MetadataRecord, ReadError>> {
        let handles: Vec<_> = raws
            .iter()
            .map(|raw| {
                let service = self.clone();
                let raw = raw.clone();
                tokio::spawn(async move { service.read(&raw).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (raw, handle) in raws.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    log::error!("Read task for {raw:?} failed: {e}");
                    Err(ReadError::Decode(DecodeError::Other(format!("read task failed: {e}"))))
                }
            };
            results.push(result);
        }
        results
    }

    /// Dimensions and orientation only. Never fails: anything that stops the
    /// read yields [`BasicInfo::unavailable`].
    pub async fn image_info(&self, raw: &str) -> BasicInfo {
        let resolution = match self.admit(raw) {
            Ok(r) => r,
            Err(_) => return BasicInfo::unavailable(),
        };

        match self.decoder.decode(resolution.path(), BASIC_FIELDS).await {
            Ok(raw_metadata) => BasicInfo::from_raw(&raw_metadata),
            Err(e) => {
                log::warn!("Basic read failed for {}: {e}", resolution.path());
                BasicInfo::unavailable()
            }
        }
    }

    /// Resolve and run the checks that need no file access.
    fn admit(&self, raw: &str) -> Result<Resolution, ReadError> {
        let resolution = self.resolver.resolve(raw);

        if let Some(err) = ReadError::from_reason(resolution.verdict.reason, resolution.path()) {
            return Err(refused(err));
        }
        if !resolution.is_supported() {
            return Err(refused(ReadError::UnsupportedFormat {
                path: resolution.path().to_string(),
            }));
        }
        Ok(resolution)
    }
}

fn refused(err: ReadError) -> ReadError {
    log::warn!("[{}] {err}", err.code());
    err
}

/// Expand command-line inputs into locators.
///
/// Inputs naming an existing directory are walked recursively (following
/// symlinks) and replaced by the supported images inside. Everything else is
/// passed through untouched, so `app://` and `file://` locators, and files
/// the pipeline will refuse, still reach it.
///
/// # Example
///
/// ```rust,no_run
/// use photo_exif::pipeline::collect_locators;
///
/// let locators = collect_locators(&[
///     "photo.jpg".to_string(),      // single file
///     "./photos/".to_string(),      // entire directory
/// ]);
/// println!("Found {} images", locators.len());
/// ```
pub fn collect_locators(inputs: &[String]) -> Vec<String> {
    let mut locators = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if !path.is_dir() {
            locators.push(input.clone());
            continue;
        }

        let before = locators.len();
        for entry in WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            let s = p.to_string_lossy();
            if p.is_file() && is_supported(&s) {
                locators.push(s.into_owned());
            }
        }
        if locators.len() == before {
            log::warn!("No supported images under {}", path.display());
        }
    }

    locators
}
