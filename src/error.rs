/// Crate-level error types for altlookup.
use std::path::PathBuf;

use crate::types::SourceLocation;

/// All errors in altlookup carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, language, or location involved.
///
/// The lookup-configuration variants never abort a conversion: the driver
/// turns them into a single error diagnostic and disables lookups for the run.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two lookup records name the same alternative language.
    #[error("duplicate alternative language: `{lang}`")]
    DuplicateAlternative {
        /// Alternative language that appeared more than once.
        lang: String,
    },

    /// An input document does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// An include directive in a primary document names a missing file.
    #[error("{location}: include file not found: {target}")]
    IncludeNotFound {
        /// Where the include directive appears.
        location: SourceLocation,
        /// The include target after attribute substitution.
        target: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of the summary failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// A lookup record names a directory that does not exist.
    #[error("alternative language directory does not exist: {}", dir.display())]
    LookupDirectoryNotFound {
        /// Absolute path of the missing directory.
        dir: PathBuf,
    },

    /// A lookup record does not have exactly three fields.
    #[error("malformed lookup on line {line}: `{content}` (expected source,alternative,directory)")]
    MalformedLookup {
        /// Raw text of the offending record.
        content: String,
        /// One-based line number within the lookup text.
        line: usize,
    },

    /// TOML deserialization of `.altlookup.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
