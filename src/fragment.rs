//! Loading alternative snippets from disk as parsed fragments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostics;
use crate::document::{Block, Document};
use crate::parser::{self, IncludeMode};
use crate::types::{Digest, SourceLocation};

/// Outcome of looking for one alternative of one listing.
#[derive(Debug)]
pub enum LoadResult {
    /// A snippet exists and declares the expected language.
    Found(Document),
    /// No snippet, or one that was rejected.
    NotFound,
}

/// Reads `<dir>/<digest>.adoc` files and parses them like any other document.
///
/// File contents are cached by path: listings with identical bodies share a
/// digest, so each snippet is read at most once per run.
#[derive(Debug, Default)]
pub struct FragmentLoader {
    /// Path to file contents; `None` records a file known to be absent.
    contents: HashMap<PathBuf, Option<String>>,
}

impl FragmentLoader {
    /// Look up the alternative for `digest` in `dir`.
    ///
    /// A missing file is the normal "not written yet" case and is silent.
    /// Unresolvable includes inside the snippet are logged as errors but the
    /// snippet is still `Found`. A snippet whose first block is not a listing
    /// in `expected_lang` is logged as a warning and reported as `NotFound`.
    pub fn load(
        &mut self,
        dir: &Path,
        digest: &Digest,
        expected_lang: &str,
        diagnostics: &mut Diagnostics,
    ) -> LoadResult {
        let path = dir.join(digest.file_name());
        let Some(content) = self.read(&path, diagnostics) else {
            return LoadResult::NotFound;
        };

        let fragment = match parser::parse_str(&path, &content, IncludeMode::Lenient, diagnostics) {
            Ok(doc) => doc,
            Err(e) => {
                diagnostics.error(Some(&SourceLocation::new(&path, 1)), e.to_string());
                return LoadResult::NotFound;
            },
        };

        let declared = match fragment.blocks.first() {
            Some(Block::Listing(listing)) => listing.language.as_deref(),
            _ => None,
        };
        if declared != Some(expected_lang) {
            let location = fragment
                .blocks
                .first()
                .map_or_else(|| return SourceLocation::new(&path, 1), |b| return b.location().clone());
            diagnostics.warn(
                Some(&location),
                format!("alternative language listing must start with [source,{expected_lang}]"),
            );
            return LoadResult::NotFound;
        }

        log::debug!("loaded alternative {}", path.display());
        return LoadResult::Found(fragment);
    }

    /// Cached read. Missing files return `None` silently; unreadable ones log an error.
    fn read(&mut self, path: &Path, diagnostics: &mut Diagnostics) -> Option<String> {
        if let Some(cached) = self.contents.get(path) {
            return cached.clone();
        }
        let content = match std::fs::read_to_string(path) {
            Ok(c) => Some(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                diagnostics.error(Some(&SourceLocation::new(path, 1)), format!("cannot read alternative: {e}"));
                None
            },
        };
        self.contents.insert(path.to_path_buf(), content.clone());
        return content;
    }
}
