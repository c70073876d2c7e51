use std::fmt::Write as _;

use crate::error::Error;
use crate::types::{Severity, SourceLocation};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One warning or error produced while converting, pinned to a file and line
/// when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the problem is; `None` for lookups given on the command line.
    pub location: Option<SourceLocation>,
    /// Human-readable description.
    pub message: String,
    /// Error or warning.
    pub severity: Severity,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.message),
            None => write!(f, "{}", self.message),
        };
    }
}

/// Collects diagnostics for one conversion run and forwards each to `log`.
///
/// Nothing pushed here stops a conversion; fatal problems travel as `Error`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Diagnostics in the order they were raised.
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Number of diagnostics with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        return self.entries.iter().filter(|d| return d.severity == severity).count();
    }

    /// All diagnostics so far.
    #[cfg(test)]
    pub fn entries(&self) -> &[Diagnostic] {
        return &self.entries;
    }

    /// Record an error.
    pub fn error(&mut self, location: Option<&SourceLocation>, message: impl Into<String>) {
        self.push(Severity::Error, location, message.into());
    }

    fn push(&mut self, severity: Severity, location: Option<&SourceLocation>, message: String) {
        let diagnostic = Diagnostic {
            location: location.cloned(),
            message,
            severity,
        };
        match severity {
            Severity::Error => log::error!("{diagnostic}"),
            Severity::Warning => log::warn!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    /// Record a warning.
    pub fn warn(&mut self, location: Option<&SourceLocation>, message: impl Into<String>) {
        self.push(Severity::Warning, location, message.into());
    }
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DuplicateAlternative { lang } => render_duplicate_alternative(lang),
        Error::IncludeNotFound { location, target } => render_include_not_found(location, target),
        Error::LookupDirectoryNotFound { dir } => format!("\
# Error: Lookup Directory Not Found

`{}` does not exist.

## Fix

Create the directory or correct the third field of the lookup record.
", dir.display()),
        Error::MalformedLookup { line, content } => render_malformed_lookup(*line, content),
        _ => render_generic(e),
    };
}

fn render_duplicate_alternative(lang: &str) -> String {
    return format!(
        "\
# Error: Duplicate Alternative Language

`{lang}` is configured more than once.

## Fix

Each alternative language may appear in only one lookup record,
even across different source languages.
"
    );
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Serialization

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `.altlookup.toml`. Supported keys: `lookups`, `report`, `summary`.
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_include_not_found(location: &SourceLocation, target: &str) -> String {
    let mut out = format!(
        "\
# Error: Include Not Found

`{target}` does not exist.

## Referenced from

"
    );
    let _ = writeln!(out, "- {location}");
    return out;
}

fn render_malformed_lookup(line: usize, content: &str) -> String {
    return format!(
        "\
# Error: Malformed Lookup

Line {line} of the lookup configuration is `{content}`.

## Fix

Every record must be `source,alternative,directory`, for example:

    console,js,examples/js
"
    );
}
