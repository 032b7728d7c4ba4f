use serde::Serialize;

/// Default upper bound on canonical path length, in characters.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 2000;

const TRAVERSAL_PATTERNS: &[&str] = &["../", "..\\"];

const INJECTION_PATTERNS: &[&str] = &["<script", "javascript:", "data:"];

/// System directories refused for every locator scheme.
const SYSTEM_DIRECTORIES: &[&str] = &[
    "/etc/", "\\etc\\",
    "/system32/", "\\system32\\",
    "/windows/system32/", "\\windows\\system32\\",
    "/usr/bin/", "\\usr\\bin\\",
    "/bin/", "\\bin\\",
    "/proc/", "\\proc\\",
    "/dev/", "\\dev\\",
    "/sys/", "\\sys\\",
];

/// Extra entries for file:// and plain paths. These are bare substrings, so a
/// file merely named `system32.jpg` is refused too.
const STRICT_ONLY_DIRECTORIES: &[&str] = &[
    "/program files/", "\\program files\\",
    "system32",
    "windows/system32",
    "program files",
];

/// Why a path was accepted or refused. Exactly one per verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Ok,
    Traversal,
    DenylistedSystemPath,
    TooLong,
    SuspiciousPattern,
    HiddenRootFile,
    MalformedScheme,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Traversal => "TRAVERSAL",
            Self::DenylistedSystemPath => "DENYLISTED_SYSTEM_PATH",
            Self::TooLong => "TOO_LONG",
            Self::SuspiciousPattern => "SUSPICIOUS_PATTERN",
            Self::HiddenRootFile => "HIDDEN_ROOT_FILE",
            Self::MalformedScheme => "MALFORMED_SCHEME",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running a [`ValidationPolicy`] over one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub accepted: bool,
    pub reason: ReasonCode,
}

impl ValidationVerdict {
    pub fn accept() -> Self {
        Self { accepted: true, reason: ReasonCode::Ok }
    }

    pub fn reject(reason: ReasonCode) -> Self {
        debug_assert!(reason != ReasonCode::Ok);
        Self { accepted: false, reason }
    }
}

/// Which rule set a path is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// For paths resolved from `app://` locators, which are legitimately absolute.
    Lenient,
    /// For `file://` and plain paths.
    Strict,
}

/// A configurable set of path-safety rules.
///
/// Both policies share one evaluator; they differ only in their denylist and
/// in whether root-level dotfiles are refused. Rules run in a fixed order and
/// the first failure decides the verdict:
///
/// 1. traversal (`../`, `..\`)
/// 2. system-directory denylist (case-insensitive)
/// 3. length
/// 4. injection-like substrings (`<script`, `javascript:`, `data:`)
/// 5. root-level dotfile (strict only)
///
/// ```rust
/// use photo_exif::path::{ReasonCode, ValidationPolicy};
///
/// let strict = ValidationPolicy::strict();
/// assert_eq!(strict.evaluate("../../../etc/passwd").reason, ReasonCode::Traversal);
/// assert_eq!(strict.evaluate("/usr/bin/bash").reason, ReasonCode::DenylistedSystemPath);
/// assert!(strict.evaluate("images/photo.jpg").accepted);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    kind: PolicyKind,
    traversal_patterns: Vec<String>,
    denylist: Vec<String>,
    max_length: usize,
    injection_patterns: Vec<String>,
    reject_hidden_root_files: bool,
}

type Rule = fn(&ValidationPolicy, &str) -> bool;

/// Evaluation order. Each rule returns `true` when the path violates it.
const RULES: &[(ReasonCode, Rule)] = &[
    (ReasonCode::Traversal, ValidationPolicy::has_traversal),
    (ReasonCode::DenylistedSystemPath, ValidationPolicy::hits_denylist),
    (ReasonCode::TooLong, ValidationPolicy::too_long),
    (ReasonCode::SuspiciousPattern, ValidationPolicy::looks_injected),
    (ReasonCode::HiddenRootFile, ValidationPolicy::is_hidden_root_file),
];

impl ValidationPolicy {
    pub fn lenient() -> Self {
        Self::build(PolicyKind::Lenient, SYSTEM_DIRECTORIES.iter(), false)
    }

    pub fn strict() -> Self {
        Self::build(
            PolicyKind::Strict,
            SYSTEM_DIRECTORIES.iter().chain(STRICT_ONLY_DIRECTORIES),
            true,
        )
    }

    fn build<'a>(
        kind: PolicyKind,
        denylist: impl Iterator<Item = &'a &'static str>,
        reject_hidden_root_files: bool,
    ) -> Self {
        Self {
            kind,
            traversal_patterns: TRAVERSAL_PATTERNS.iter().map(|s| s.to_string()).collect(),
            denylist: denylist.map(|s| s.to_lowercase()).collect(),
            max_length: DEFAULT_MAX_PATH_LENGTH,
            injection_patterns: INJECTION_PATTERNS.iter().map(|s| s.to_string()).collect(),
            reject_hidden_root_files,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Append denylist entries; they are matched case-insensitively.
    pub fn with_extra_denylist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denylist
            .extend(entries.into_iter().map(|s| s.as_ref().to_lowercase()));
        self
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    /// Run every rule in order; the first one that fires decides the verdict.
    pub fn evaluate(&self, path: &str) -> ValidationVerdict {
        for (reason, violated) in RULES {
            if violated(self, path) {
                log::warn!("{:?} policy rejected {path:?}: {reason}", self.kind);
                return ValidationVerdict::reject(*reason);
            }
        }
        log::debug!("{:?} policy accepted {path:?}", self.kind);
        ValidationVerdict::accept()
    }

    pub fn has_traversal(&self, path: &str) -> bool {
        self.traversal_patterns.iter().any(|p| path.contains(p.as_str()))
    }

    /// The first denylist entry found in `path`, if any.
    pub fn denylist_hit(&self, path: &str) -> Option<&str> {
        let lower = path.to_lowercase();
        self.denylist
            .iter()
            .find(|entry| lower.contains(entry.as_str()))
            .map(String::as_str)
    }

    fn hits_denylist(&self, path: &str) -> bool {
        self.denylist_hit(path).is_some()
    }

    fn too_long(&self, path: &str) -> bool {
        path.chars().count() > self.max_length
    }

    fn looks_injected(&self, path: &str) -> bool {
        self.injection_patterns.iter().any(|p| path.contains(p.as_str()))
    }

    fn is_hidden_root_file(&self, path: &str) -> bool {
        self.reject_hidden_root_files
            && path.starts_with('.')
            && !path.contains('/')
            && !path.contains('\\')
    }
}
