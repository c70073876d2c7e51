/// Core value types shared by the parser, the lookup engine and the reporters.
use std::fmt;
use std::path::PathBuf;

/// Content digest of a listing body — 32 lowercase hex chars.
/// Newtype prevents mixing with arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Digest(
    /// The hex-encoded, truncated SHA-256 digest string.
    pub String,
);

impl Digest {
    /// File name an alternative for this digest is stored under.
    pub fn file_name(&self) -> String {
        return format!("{}.adoc", self.0);
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// How bad a diagnostic is. Neither level aborts a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was skipped or disabled.
    Error,
    /// Something looks wrong but output is unaffected or degraded gracefully.
    Warning,
}

/// A file and one-based line number. Every diagnostic about a listing
/// or fragment points at one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File the line was read from.
    pub file: PathBuf,
    /// One-based line number in `file`.
    pub line: usize,
}

impl SourceLocation {
    /// Build a location from a path and one-based line.
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        return Self { file: file.into(), line };
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}: line {}", self.file.display(), self.line);
    }
}
