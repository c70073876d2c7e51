//! The human-readable alternatives report: one AsciiDoc section per
//! processed listing, in traversal order, showing which alternatives exist.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;
use crate::types::{Digest, SourceLocation};

const FOUND: &str = "&check;";
const MISSING: &str = "&cross;";

/// One processed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// `(alternative language, found)` in configuration order.
    pub alternatives: Vec<(String, bool)>,
    /// Digest used for the lookup.
    pub digest: Digest,
    /// True for `-result` listings; column labels get the suffix.
    pub is_result: bool,
    /// The listing's declared language.
    pub lang: String,
    /// Where the listing is.
    pub location: SourceLocation,
    /// Verbatim listing body.
    pub source: String,
}

/// Report entries, appended during the walk and rendered once at the end.
#[derive(Debug, Default)]
pub struct Report {
    /// Entries in traversal order.
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Entries so far.
    pub fn entries(&self) -> &[ReportEntry] {
        return &self.entries;
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Render the whole report as AsciiDoc.
    pub fn render(&self) -> String {
        let mut out = String::from("= Alternatives Report\n\n");
        for entry in &self.entries {
            render_entry(&mut out, entry);
        }
        return out;
    }

    /// Write the rendered report to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        std::fs::write(path, self.render())?;
        log::info!("wrote alternatives report to {}", path.display());
        return Ok(());
    }
}

/// Escape `<` so the report's own AsciiDoc parser does not read callouts or markup.
fn escape_source(source: &str) -> String {
    return source.replace('<', "\\<");
}

fn render_entry(out: &mut String, entry: &ReportEntry) {
    let suffix = if entry.is_result { "-result" } else { "" };
    let _ = writeln!(out, "=== {}: {}", entry.location, entry.digest.file_name());
    let _ = writeln!(out, "[source,{}]", entry.lang);
    out.push_str("----\n");
    out.push_str(&escape_source(&entry.source));
    out.push_str("\n----\n|===\n");
    for (lang, _) in &entry.alternatives {
        let _ = write!(out, "| {lang}{suffix} ");
    }
    out.push_str("\n\n");
    for (_, found) in &entry.alternatives {
        let _ = write!(out, "| {} ", if *found { FOUND } else { MISSING });
    }
    out.push_str("\n|===\n\n");
}
