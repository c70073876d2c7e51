use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::Error;
use crate::types::SourceLocation;

/// Document attribute holding lookup records.
pub const LOOKUPS_ATTRIBUTE: &str = "alternative_language_lookups";
/// Document attribute naming the report destination.
pub const REPORT_ATTRIBUTE: &str = "alternative_language_report";
/// Document attribute naming the summary destination.
pub const SUMMARY_ATTRIBUTE: &str = "alternative_language_summary";

/// Project configuration loaded from `.altlookup.toml`, with command-line
/// overrides applied on top. Document attributes fill whatever is still unset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// `source,alternative,directory` records, one per line.
    pub lookups: Option<String>,
    /// Line of the `lookups` key in `.altlookup.toml`; `None` when the
    /// records came from the command line.
    pub lookups_location: Option<SourceLocation>,
    /// Where to write the text report.
    pub report: Option<PathBuf>,
    /// Where to write the JSON summary.
    pub summary: Option<PathBuf>,
}

/// Raw TOML structure for `.altlookup.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AltlookupTomlConfig {
    #[serde(default)]
    lookups: Option<String>,
    #[serde(default)]
    report: Option<PathBuf>,
    #[serde(default)]
    summary: Option<PathBuf>,
}

/// Lookup records and where they were declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSource {
    /// Attribute entry or `.altlookup.toml` line; `None` for the command line.
    pub location: Option<SourceLocation>,
    /// The records.
    pub text: String,
}

impl Config {
    /// Load config from `.altlookup.toml` in the given root directory.
    /// Returns an empty config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed, never silently
    /// falling back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".altlookup.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: AltlookupTomlConfig = toml::from_str(&content)?;
        log::debug!("loaded {}", path.display());
        let lookups_location =
            raw.lookups.as_ref().map(|_| return SourceLocation::new(&path, key_line(&content, "lookups")));
        Ok(Self {
            lookups: raw.lookups,
            lookups_location,
            report: raw.report,
            summary: raw.summary,
        })
    }

    /// Records set in `.altlookup.toml` or on the command line, if any.
    pub fn configured_lookups(&self) -> Option<LookupSource> {
        return self.lookups.as_ref().map(|text| {
            return LookupSource { location: self.lookups_location.clone(), text: text.clone() };
        });
    }

    /// Lookup records for `document`: configured ones win, otherwise the
    /// document's own attribute.
    pub fn lookups_for(&self, document: &Document) -> Option<LookupSource> {
        if let Some(source) = self.configured_lookups() {
            return Some(source);
        }
        return document.attributes.get(LOOKUPS_ATTRIBUTE).map(|entry| {
            return LookupSource { location: Some(entry.location.clone()), text: entry.value.clone() };
        });
    }

    /// Report destination, configured or from `document`.
    pub fn report_for(&self, document: &Document) -> Option<PathBuf> {
        return self.report.clone().or_else(|| return document.attribute(REPORT_ATTRIBUTE).map(PathBuf::from));
    }

    /// Summary destination, configured or from `document`.
    pub fn summary_for(&self, document: &Document) -> Option<PathBuf> {
        return self.summary.clone().or_else(|| return document.attribute(SUMMARY_ATTRIBUTE).map(PathBuf::from));
    }

    /// Apply command-line values over the file's.
    #[must_use]
    pub fn with_overrides(self, lookups: Option<String>, report: Option<PathBuf>, summary: Option<PathBuf>) -> Self {
        let (lookups, lookups_location) = match lookups {
            Some(text) => (Some(text), None),
            None => (self.lookups, self.lookups_location),
        };
        Self {
            lookups,
            lookups_location,
            report: report.or(self.report),
            summary: summary.or(self.summary),
        }
    }
}

/// 1-based line on which `key = ...` is assigned, or 1 if it cannot be found.
fn key_line(content: &str, key: &str) -> usize {
    return content
        .lines()
        .position(|line| {
            let Some(rest) = line.trim_start().strip_prefix(key) else { return false };
            return rest.trim_start().starts_with('=');
        })
        .map_or(1, |index| return index.saturating_add(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::{IncludeMode, parse_str};

    fn doc(content: &str) -> Document {
        let mut diags = Diagnostics::default();
        return parse_str(Path::new("index.adoc"), content, IncludeMode::Strict, &mut diags).unwrap();
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn loads_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".altlookup.toml"),
            "lookups = \"\"\"\nconsole,js,alt/js\n\"\"\"\nreport = \"report.adoc\"\nsummary = \"summary.json\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.lookups.as_deref(), Some("console,js,alt/js\n"));
        assert_eq!(config.report, Some(PathBuf::from("report.adoc")));
        assert_eq!(config.summary, Some(PathBuf::from("summary.json")));
        assert_eq!(config.lookups_location, Some(SourceLocation::new(dir.path().join(".altlookup.toml"), 1)));
    }

    #[test]
    fn file_lookups_carry_their_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".altlookup.toml"),
            "report = \"report.adoc\"\n\n  lookups = \"console,js,alt/js\"\n",
        )
        .unwrap();
        let source = Config::load(dir.path()).unwrap().with_overrides(None, None, None).configured_lookups().unwrap();
        assert_eq!(source.location, Some(SourceLocation::new(dir.path().join(".altlookup.toml"), 3)));
        assert_eq!(source.text, "console,js,alt/js");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".altlookup.toml"), "lookup = 3\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn command_line_overrides_file() {
        let file = Config {
            lookups: Some("a".to_string()),
            lookups_location: Some(SourceLocation::new(".altlookup.toml", 1)),
            report: Some(PathBuf::from("r")),
            summary: None,
        };
        let merged = file.with_overrides(Some("b".to_string()), None, Some(PathBuf::from("s")));
        assert_eq!(merged.lookups.as_deref(), Some("b"));
        assert_eq!(merged.lookups_location, None);
        assert_eq!(merged.report, Some(PathBuf::from("r")));
        assert_eq!(merged.summary, Some(PathBuf::from("s")));
    }

    #[test]
    fn document_attributes_are_the_fallback() {
        let document = doc(
            "= Guide\n:alternative_language_lookups: console,js,alt/js\n:alternative_language_report: out.adoc\n\nText\n",
        );
        let config = Config::default();
        let source = config.lookups_for(&document).unwrap();
        assert_eq!(source.text, "console,js,alt/js");
        assert_eq!(source.location, Some(SourceLocation::new("index.adoc", 2)));
        assert_eq!(config.report_for(&document), Some(PathBuf::from("out.adoc")));
        assert_eq!(config.summary_for(&document), None);

        let configured = Config { lookups: Some(String::new()), ..Config::default() };
        assert_eq!(configured.lookups_for(&document).unwrap().text, "");
    }
}
