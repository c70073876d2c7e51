//! Lookup configuration: which alternative languages exist for which
//! source languages, and where their snippets live.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Suffix that marks a listing as the response paired with a request listing.
pub const RESULT_SUFFIX: &str = "-result";

/// One configured alternative for a source language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// Absolute directory holding `<digest>.adoc` snippets.
    pub dir: PathBuf,
    /// Language of the alternative, e.g. `js`.
    pub lang: String,
}

/// A listing language matched against the index.
#[derive(Debug, Clone, Copy)]
pub struct Eligible<'a> {
    /// Alternatives in configuration order.
    pub alternatives: &'a [Alternative],
    /// True for `<source>-result` listings.
    pub is_result: bool,
    /// The configured source language (without `-result`).
    pub source_lang: &'a str,
}

/// Validated lookups keyed by source language. Alternatives keep the order
/// they were configured in; that order drives splice order and report columns.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LookupIndex {
    /// Source language to its alternatives.
    by_source: BTreeMap<String, Vec<Alternative>>,
}

impl LookupIndex {
    /// Match a listing language, either `<source>` or `<source>-result`.
    pub fn eligible<'a>(&'a self, language: &'a str) -> Option<Eligible<'a>> {
        if let Some((source_lang, alternatives)) = self.by_source.get_key_value(language) {
            return Some(Eligible { alternatives, is_result: false, source_lang });
        }
        let base = language.strip_suffix(RESULT_SUFFIX)?;
        let (source_lang, alternatives) = self.by_source.get_key_value(base)?;
        return Some(Eligible { alternatives, is_result: true, source_lang });
    }

    /// True when nothing is configured; lookups are then disabled.
    pub fn is_empty(&self) -> bool {
        return self.by_source.is_empty();
    }

    /// Source languages with at least one alternative.
    pub fn source_langs(&self) -> impl Iterator<Item = &str> {
        return self.by_source.keys().map(String::as_str);
    }
}

/// Parse and validate lookup records, one `source,alternative,directory` per line.
///
/// Blank input yields an empty index. Relative directories resolve against `base`.
/// An alternative language may appear only once in the whole configuration,
/// even under different source languages.
///
/// # Errors
///
/// Returns `Error::MalformedLookup` for a line without exactly three non-empty
/// fields, `Error::LookupDirectoryNotFound` for a missing directory, or
/// `Error::DuplicateAlternative` for a repeated alternative language.
pub fn parse(text: &str, base: &Path) -> Result<LookupIndex, Error> {
    let mut index = LookupIndex::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [source_lang, alt_lang, dir] = fields.as_slice() else {
            return Err(Error::MalformedLookup { content: line.to_string(), line: number.saturating_add(1) });
        };
        if source_lang.is_empty() || alt_lang.is_empty() || dir.is_empty() {
            return Err(Error::MalformedLookup { content: line.to_string(), line: number.saturating_add(1) });
        }

        let dir = resolve_dir(base, dir);
        if !dir.is_dir() {
            return Err(Error::LookupDirectoryNotFound { dir });
        }
        if !seen.insert((*alt_lang).to_string()) {
            return Err(Error::DuplicateAlternative { lang: (*alt_lang).to_string() });
        }

        index.by_source.entry((*source_lang).to_string()).or_default().push(Alternative {
            dir,
            lang: (*alt_lang).to_string(),
        });
    }

    return Ok(index);
}

/// Make `dir` absolute relative to `base`.
fn resolve_dir(base: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    return base.join(path);
}
