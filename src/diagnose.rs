//! Structured reports explaining why a locator does or does not yield metadata.
//!
//! Unlike [`ExifService::read`](crate::pipeline::ExifService::read), nothing
//! here stops at the first failing stage: every stage runs and records its own
//! result, so one report shows every problem at once. Decoding itself is still
//! gated: the basic and full probes only run for a path that is in the sandbox,
//! has a supported extension and exists.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::decoder::{ALL_FIELDS, BASIC_FIELDS, MetadataDecoder, NomExifDecoder};
use crate::exif::BasicInfo;
use crate::path::{
    ImageFormat, PolicyKind, ReasonCode, SUPPORTED_EXTENSIONS, Scheme, ValidationVerdict,
    extension_of,
};
use crate::pipeline::{Resolution, Resolver};
use crate::probe::{self, Existence};

/// Paths longer than this are flagged by [`DiagnosticEngine::debug_path`].
const SUSPICIOUS_PATH_LENGTH: usize = 1000;

const ALL_CHECKS_NORMAL: &str = "File is fine; all checks passed and EXIF data looks healthy";
const PATH_NORMAL: &str = "Path validation normal";

/// Outcome of decoding the full field allowlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FullProbeAttempt {
    /// `false` when an earlier stage ruled the path out.
    pub attempted: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<usize>,
}

/// Every stage's result for one locator, plus what to do about it.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    pub locator: String,
    pub resolved_path: String,
    pub policy: PolicyKind,
    /// The path passed validation.
    pub is_in_sandbox: bool,
    pub validation_reason: ReasonCode,
    pub has_traversal: bool,
    pub is_supported_format: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    pub file_exists: bool,
    pub existence: Existence,
    pub basic_probe: BasicInfo,
    pub full_probe: FullProbeAttempt,
    /// Never empty.
    pub recommendations: Vec<String>,
}

/// Lexical facts about a resolved path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathDetails {
    pub is_absolute: bool,
    pub is_relative: bool,
    pub has_traversal: bool,
    /// Length of the locator as supplied, in characters.
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub dirname: String,
    pub basename: String,
}

/// How a locator resolves, without decoding anything.
#[derive(Debug, Clone, Serialize)]
pub struct PathDebugReport {
    pub original: String,
    pub converted: String,
    pub scheme: Scheme,
    pub policy: PolicyKind,
    pub validation: ValidationVerdict,
    pub file_exists: bool,
    pub details: PathDetails,
    /// Never empty.
    pub recommendations: Vec<String>,
}

type DiagnosisRule = fn(&DiagnosisReport) -> Option<String>;

/// Checked in order; every rule that fires contributes one line.
const DIAGNOSIS_RULES: &[DiagnosisRule] = &[
    |r| {
        (!r.is_in_sandbox).then(|| {
            format!(
                "Path validation failed ({}); the security check may be overly strict for this path",
                r.validation_reason
            )
        })
    },
    |r| r.has_traversal.then(|| "Path traversal pattern detected".to_string()),
    |r| {
        (!r.is_supported_format).then(|| {
            format!(
                "Unsupported image format; use one of {}",
                SUPPORTED_EXTENSIONS.join(" ")
            )
        })
    },
    |r| {
        (!r.file_exists).then(|| {
            format!("File not found or not accessible; check the path: {}", r.resolved_path)
        })
    },
    |r| {
        (r.full_probe.attempted && !r.basic_probe.has_basic_exif)
            .then(|| "Image file may be damaged or its EXIF structure is abnormal".to_string())
    },
    |r| {
        let full = &r.full_probe;
        (full.attempted && !full.success && r.basic_probe.has_basic_exif).then(|| {
            format!(
                "Basic fields read but the full read failed; the EXIF structure is corrupted or unusual: {}",
                full.error.as_deref().unwrap_or("unknown error")
            )
        })
    },
    |r| {
        let full = &r.full_probe;
        (full.attempted && !full.success && !r.basic_probe.has_basic_exif).then(|| {
            format!(
                "EXIF parsing failed: {}",
                full.error.as_deref().unwrap_or("unknown error")
            )
        })
    },
    |r| {
        (r.full_probe.success && r.full_probe.field_count == Some(0))
            .then(|| "The image genuinely has no embedded metadata".to_string())
    },
];

type DebugRule = fn(&PathDebugReport) -> Option<String>;

const DEBUG_RULES: &[DebugRule] = &[
    |r| (!r.file_exists).then(|| format!("File not found: {}", r.converted)),
    |r| {
        (!r.validation.accepted).then(|| {
            format!(
                "Path validation failed ({}); the security check may be overly strict",
                r.validation.reason
            )
        })
    },
    |r| r.details.has_traversal.then(|| "Path traversal pattern detected".to_string()),
    |r| {
        (r.details.length > SUSPICIOUS_PATH_LENGTH)
            .then(|| "Path is unusually long and may be malformed".to_string())
    },
];

/// Produces [`DiagnosisReport`]s and [`PathDebugReport`]s.
///
/// Shares the [`Resolver`] with the read path, so a diagnosis always sees the
/// same canonical path and verdict a read would.
///
/// # Example
///
/// ```rust,no_run
/// use photo_exif::config::Config;
/// use photo_exif::diagnose::DiagnosticEngine;
///
/// # async fn example() {
/// let engine = DiagnosticEngine::from_config(&Config::default());
/// let report = engine.diagnose("file:///Users/a/Photos/IMG_0001.jpg").await;
/// for line in &report.recommendations {
///     println!("- {line}");
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct DiagnosticEngine {
    decoder: Arc<dyn MetadataDecoder>,
    resolver: Arc<Resolver>,
}

impl DiagnosticEngine {
    pub fn new(decoder: Arc<dyn MetadataDecoder>, resolver: Resolver) -> Self {
        Self { decoder, resolver: Arc::new(resolver) }
    }

    /// An engine backed by [`NomExifDecoder`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(NomExifDecoder::new()), Resolver::from_config(config))
    }

    /// Run every stage against `raw` and explain the outcome.
    pub async fn diagnose(&self, raw: &str) -> DiagnosisReport {
        log::info!("Diagnosing {raw:?}");
        let resolution = self.resolver.resolve(raw);
        let path = resolution.path();

        let existence = probe::probe(self.decoder.as_ref(), path).await;
        let file_exists = existence.exists();

        let mut basic_probe = BasicInfo::unavailable();
        let mut full_probe = FullProbeAttempt::default();

        if resolution.verdict.accepted && resolution.is_supported() && file_exists {
            basic_probe = match self.decoder.decode(path, BASIC_FIELDS).await {
                Ok(raw_metadata) => BasicInfo::from_raw(&raw_metadata),
                Err(e) => {
                    log::warn!("Basic EXIF unavailable for {path}: {e}");
                    BasicInfo::unavailable()
                }
            };

            full_probe = match self.decoder.decode(path, ALL_FIELDS).await {
                Ok(raw_metadata) => {
                    log::info!("Full EXIF read succeeded: {} fields", raw_metadata.len());
                    FullProbeAttempt {
                        attempted: true,
                        success: true,
                        error: None,
                        field_count: Some(raw_metadata.len()),
                    }
                }
                Err(e) => {
                    log::error!("Full EXIF read failed for {path}: {e}");
                    FullProbeAttempt {
                        attempted: true,
                        success: false,
                        error: Some(e.to_string()),
                        field_count: None,
                    }
                }
            };
        }

        let mut report = DiagnosisReport {
            locator: raw.to_string(),
            resolved_path: path.to_string(),
            policy: resolution.policy,
            is_in_sandbox: resolution.verdict.accepted,
            validation_reason: resolution.verdict.reason,
            has_traversal: self.has_traversal(&resolution),
            is_supported_format: resolution.is_supported(),
            format: resolution.format,
            file_exists,
            existence,
            basic_probe,
            full_probe,
            recommendations: Vec::new(),
        };
        report.recommendations = recommend(&report, DIAGNOSIS_RULES, ALL_CHECKS_NORMAL);
        report
    }

    /// Show how `raw` resolves and whether the result is reachable.
    pub async fn debug_path(&self, raw: &str) -> PathDebugReport {
        let resolution = self.resolver.resolve(raw);
        let path = resolution.path();
        let file_exists = probe::probe(self.decoder.as_ref(), path).await.exists();

        let (dirname, basename) = match path.rfind(['/', '\\']) {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => ("", path),
        };
        let is_absolute = is_absolute(path);

        let details = PathDetails {
            is_absolute,
            is_relative: !is_absolute,
            has_traversal: self.has_traversal(&resolution),
            length: raw.chars().count(),
            extension: extension_of(basename).map(str::to_string),
            dirname: dirname.to_string(),
            basename: basename.to_string(),
        };

        let mut report = PathDebugReport {
            original: raw.to_string(),
            converted: path.to_string(),
            scheme: resolution.locator.scheme(),
            policy: resolution.policy,
            validation: resolution.verdict,
            file_exists,
            details,
            recommendations: Vec::new(),
        };
        report.recommendations = recommend(&report, DEBUG_RULES, PATH_NORMAL);
        report
    }

    fn has_traversal(&self, resolution: &Resolution) -> bool {
        self.resolver
            .policy(resolution.policy)
            .has_traversal(resolution.path())
    }
}

fn recommend<R>(report: &R, rules: &[fn(&R) -> Option<String>], fallback: &str) -> Vec<String> {
    let mut lines: Vec<String> = rules.iter().filter_map(|rule| rule(report)).collect();
    if lines.is_empty() {
        lines.push(fallback.to_string());
    }
    lines
}

/// Root-anchored POSIX or UNC-ish path, or a drive-letter path.
fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || path.starts_with('\\')
        || (bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'\\' || bytes[2] == b'/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::stub::{Script, StubDecoder};
    use crate::decoder::{DecodeError, Field, RawMetadata, RawValue, fixtures};
    use crate::path::PathStyle;

    fn engine(decoder: StubDecoder) -> (DiagnosticEngine, Arc<StubDecoder>) {
        let decoder = Arc::new(decoder);
        let engine = DiagnosticEngine::new(decoder.clone(), Resolver::new(PathStyle::Posix));
        (engine, decoder)
    }

    fn photo() -> RawMetadata {
        [
            (Field::ImageWidth, RawValue::Number(4000.0)),
            (Field::ImageHeight, RawValue::Number(3000.0)),
            (Field::Orientation, RawValue::Number(1.0)),
            (Field::Make, RawValue::Text("SONY".into())),
        ]
        .into_iter()
        .collect()
    }

    // ── diagnose ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn healthy_file_gets_single_all_clear() {
        let (engine, _) = engine(StubDecoder::new().with_file("/p/a.jpg", photo()));
        let report = engine.diagnose("/p/a.jpg?v=2").await;

        assert!(report.is_in_sandbox && report.is_supported_format && report.file_exists);
        assert_eq!(report.resolved_path, "/p/a.jpg");
        assert!(report.basic_probe.has_basic_exif);
        assert_eq!(report.basic_probe.width, Some(4000));
        assert!(report.full_probe.success);
        assert_eq!(report.full_probe.field_count, Some(4));
        assert_eq!(report.recommendations, vec![ALL_CHECKS_NORMAL.to_string()]);
    }

    #[tokio::test]
    async fn rejected_path_is_never_decoded() {
        let (engine, decoder) = engine(StubDecoder::new().with_file("/etc/a.jpg", photo()));
        let report = engine.diagnose("app://id/etc/a.jpg").await;

        assert!(!report.is_in_sandbox);
        assert_eq!(report.validation_reason, ReasonCode::DenylistedSystemPath);
        assert!(report.file_exists);
        assert!(!report.full_probe.attempted);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("DENYLISTED_SYSTEM_PATH"));
        assert_eq!(decoder.calls(), vec![("/etc/a.jpg".to_string(), 0)]);
    }

    #[tokio::test]
    async fn every_failing_dimension_is_reported() {
        let (engine, _) = engine(StubDecoder::new());
        let report = engine.diagnose("../notes.txt").await;

        assert!(!report.is_in_sandbox);
        assert!(report.has_traversal);
        assert!(!report.is_supported_format);
        assert!(!report.file_exists);
        let recs = &report.recommendations;
        assert_eq!(recs.len(), 4);
        assert!(recs[0].contains("TRAVERSAL"));
        assert!(recs[1].contains("traversal"));
        assert!(recs[2].contains(".jpg"));
        assert!(recs[3].contains("../notes.txt"));
    }

    #[tokio::test]
    async fn basic_ok_full_failed() {
        let (engine, _) = engine(StubDecoder::new().with_file("/p/a.jpg", photo()).with_full_read(
            "/p/a.jpg",
            Script::Fail(DecodeError::Malformed("maker note overflow".into())),
        ));
        let report = engine.diagnose("/p/a.jpg").await;

        assert!(report.basic_probe.has_basic_exif);
        assert!(!report.full_probe.success);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("corrupted or unusual"));
        assert!(report.recommendations[0].contains("maker note overflow"));
    }

    #[tokio::test]
    async fn both_probes_failed() {
        let (engine, _) = engine(
            StubDecoder::new()
                .with_probe("/p/a.jpg", Script::Fields(RawMetadata::new()))
                .with_read("/p/a.jpg", Script::Fail(DecodeError::Malformed("bad SOI".into()))),
        );
        let report = engine.diagnose("/p/a.jpg").await;

        assert!(!report.basic_probe.has_basic_exif);
        assert_eq!(report.recommendations.len(), 2);
        assert!(report.recommendations[0].contains("damaged"));
        assert!(report.recommendations[1].starts_with("EXIF parsing failed"));
    }

    #[tokio::test]
    async fn zero_fields_means_no_metadata() {
        let (engine, _) = engine(StubDecoder::new().with_file("/p/blank.png", RawMetadata::new()));
        let report = engine.diagnose("/p/blank.png").await;

        assert!(report.full_probe.success);
        assert_eq!(report.full_probe.field_count, Some(0));
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("no embedded metadata"));
    }

    #[tokio::test]
    async fn jpeg_without_exif_is_reported_as_having_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scan.jpg");
        std::fs::write(&path, fixtures::jfif_without_exif()).unwrap();
        let path = path.to_string_lossy();

        let engine = DiagnosticEngine::new(
            Arc::new(NomExifDecoder::new()),
            Resolver::new(PathStyle::Posix),
        );
        let report = engine.diagnose(&path).await;

        assert!(report.file_exists);
        assert!(report.basic_probe.has_basic_exif);
        assert_eq!(report.basic_probe.width, None);
        assert!(report.full_probe.success);
        assert_eq!(report.full_probe.error, None);
        assert_eq!(report.full_probe.field_count, Some(0));
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("no embedded metadata"));
    }

    #[tokio::test]
    async fn probe_warning_still_counts_as_existing() {
        let (engine, _) = engine(
            StubDecoder::new()
                .with_file("/p/a.webp", photo())
                .with_probe("/p/a.webp", Script::Fail(DecodeError::Other("odd container".into()))),
        );
        let report = engine.diagnose("/p/a.webp").await;
        assert!(report.file_exists);
        assert!(matches!(report.existence, Existence::Assumed { .. }));
        assert!(report.full_probe.success);
    }

    // ── debug_path ───────────────────────────────────────────────────

    #[tokio::test]
    async fn debug_splits_path() {
        let (engine, _) = engine(StubDecoder::new().with_file("/Users/a/My Vault/0.JPEG", photo()));
        let report = engine.debug_path("app://8cf4/Users/a/My%20Vault/0.JPEG?123").await;

        assert_eq!(report.converted, "/Users/a/My Vault/0.JPEG");
        assert_eq!(report.scheme, Scheme::App);
        assert_eq!(report.policy, PolicyKind::Lenient);
        assert!(report.validation.accepted);
        assert!(report.file_exists);
        assert_eq!(report.details.dirname, "/Users/a/My Vault");
        assert_eq!(report.details.basename, "0.JPEG");
        assert_eq!(report.details.extension.as_deref(), Some(".JPEG"));
        assert!(report.details.is_absolute && !report.details.is_relative);
        assert_eq!(report.recommendations, vec![PATH_NORMAL.to_string()]);
    }

    #[tokio::test]
    async fn debug_flags_problems() {
        let (engine, _) = engine(StubDecoder::new());
        let report = engine.debug_path("..\\photos\\a").await;

        assert!(report.details.is_relative);
        assert!(report.details.has_traversal);
        assert_eq!(report.details.dirname, "..\\photos");
        assert_eq!(report.details.extension, None);
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.recommendations[0].starts_with("File not found"));
    }

    #[tokio::test]
    async fn debug_flags_long_paths() {
        let long = format!("/p/{}.jpg", "x".repeat(1200));
        let (engine, _) = engine(StubDecoder::new().with_file(&long, photo()));
        let report = engine.debug_path(&long).await;

        assert!(report.validation.accepted);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("unusually long"));
    }

    #[test]
    fn absolute_paths() {
        assert!(is_absolute("/a"));
        assert!(is_absolute("\\\\server\\share"));
        assert!(is_absolute("C:\\a"));
        assert!(is_absolute("d:/a"));
        assert!(!is_absolute("a/b"));
        assert!(!is_absolute("C:"));
    }
}
