//! Found/not-found counts per source language and alternative language,
//! serialized as the JSON summary.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Count for one alternative language.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeCount {
    /// Listings for which this alternative was found and injected.
    pub found: u64,
}

/// Counts for one source language. `found` never exceeds `total`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCoverage {
    /// Alternative language to its count.
    pub alternatives: BTreeMap<String, AlternativeCount>,
    /// Listings processed, request and result listings alike.
    pub total: u64,
}

/// Coverage for one conversion run. Create one per run; nothing is global.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coverage {
    /// Source language to its counts.
    languages: BTreeMap<String, LanguageCoverage>,
}

impl Coverage {
    /// Counts for `source_lang`, if any listing in it was processed.
    #[cfg(test)]
    pub fn language(&self, source_lang: &str) -> Option<&LanguageCoverage> {
        return self.languages.get(source_lang);
    }

    /// Record one processed listing: bump `total` once, then each
    /// alternative's `found` when it was found. Alternatives not found still
    /// get an entry so the summary lists them with zero.
    pub fn record_listing<'a>(&mut self, source_lang: &str, outcomes: impl IntoIterator<Item = (&'a str, bool)>) {
        let entry = self.languages.entry(source_lang.to_string()).or_default();
        entry.total = entry.total.saturating_add(1);
        for (alt_lang, found) in outcomes {
            let count = entry.alternatives.entry(alt_lang.to_string()).or_default();
            if found {
                count.found = count.found.saturating_add(1);
            }
        }
    }

    /// Pretty-printed JSON, keys sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        return Ok(out);
    }

    /// Write the summary to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails or `Error::Io` if the file
    /// cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("wrote alternatives summary to {}", path.display());
        return Ok(());
    }
}
