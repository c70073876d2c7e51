//! The lookup pass: find listings with configured alternatives, load the
//! alternatives, and splice them in front of the original.
//!
//! The walk reads an immutable view of the block list and records one
//! `Splice` per listing that gained alternatives; splices are applied
//! afterwards from the back so earlier positions stay valid.

use std::cell::OnceCell;

use crate::callouts::CalloutMerger;
use crate::coverage::Coverage;
use crate::diagnostics::Diagnostics;
use crate::digest::DigestCache;
use crate::document::{Block, CalloutScope, Document, Listing};
use crate::fragment::{FragmentLoader, LoadResult};
use crate::lookups::{Eligible, LookupIndex, RESULT_SUFFIX};
use crate::report::{Report, ReportEntry};
use crate::types::{Digest, SourceLocation};

/// A listing selected for lookup. The digest is computed on first use.
#[derive(Debug)]
pub struct ListingSpec<'a> {
    /// Cached digest of `source`.
    digest: OnceCell<Digest>,
    /// True for `<source>-result` listings.
    pub is_result: bool,
    /// Declared language, e.g. `console` or `console-result`.
    pub language: &'a str,
    /// Where the listing starts.
    pub location: &'a SourceLocation,
    /// Raw body.
    pub source: &'a str,
}

impl<'a> ListingSpec<'a> {
    /// The digest of the body, memoized here and in `cache`.
    pub fn digest(&self, cache: &mut DigestCache) -> &Digest {
        return self.digest.get_or_init(|| return cache.get(self.source));
    }

    /// Describe `listing`, which must carry `language`.
    pub fn new(listing: &'a Listing, language: &'a str, is_result: bool) -> Self {
        return Self {
            digest: OnceCell::new(),
            is_result,
            language,
            location: &listing.location,
            source: &listing.source,
        };
    }
}

/// Everything one conversion run accumulates across documents.
///
/// Make a fresh one per run; coverage and report never leak between runs.
#[derive(Debug, Default)]
pub struct RunState {
    /// Per-language found counts.
    pub coverage: Coverage,
    /// Warnings and errors raised so far.
    pub diagnostics: Diagnostics,
    /// Memoized listing digests.
    digests: DigestCache,
    /// Cached fragment file contents.
    fragments: FragmentLoader,
    /// Listing-by-listing report.
    pub report: Report,
}

impl RunState {
    /// Number of distinct listing bodies digested so far.
    pub fn distinct_listings(&self) -> usize {
        return self.digests.len();
    }
}

/// Pending change for one listing that gained alternatives.
#[derive(Debug)]
struct Splice {
    /// Alternative languages found, in configuration order.
    found_langs: Vec<String>,
    /// Fragment blocks to insert before the original.
    inserted: Vec<Block>,
    /// Index of the original listing in the snapshot.
    position: usize,
    /// Source language the original's callout list is tagged with, when it has one.
    tag_callout_list: Option<String>,
}

/// Apply splices last-to-first so earlier positions stay valid.
fn apply(document: &mut Document, splices: Vec<Splice>) {
    for splice in splices.into_iter().rev() {
        if let Some(original) = document.blocks.get_mut(splice.position) {
            original.add_role("default");
            for lang in &splice.found_langs {
                original.add_role(&format!("has-{lang}"));
            }
        }
        if let Some(source_lang) = &splice.tag_callout_list
            && let Some(list) = document.blocks.get_mut(splice.position.saturating_add(1))
        {
            list.add_role(&format!("lang-{source_lang}"));
        }
        document.blocks.splice(splice.position..splice.position, splice.inserted);
    }
}

/// Whether the block after `position` is the callout list of `scope`.
fn explains(blocks: &[Block], position: usize, scope: Option<&CalloutScope>) -> bool {
    let Some(scope) = scope else { return false };
    return matches!(
        blocks.get(position.saturating_add(1)),
        Some(Block::CalloutList(list)) if list.scope.as_ref() == Some(scope)
    );
}

/// Run the lookup pass over `document`.
///
/// With an empty index this returns without touching the tree, so output is
/// identical to a conversion that never ran the pass. Every eligible listing
/// is counted in `run.coverage` and gets a `run.report` entry whether or not
/// any alternative was found.
pub fn process(document: &mut Document, index: &LookupIndex, run: &mut RunState) {
    if index.is_empty() {
        return;
    }

    let mut merger = CalloutMerger::new(document);
    let mut splices: Vec<Splice> = Vec::new();

    for (position, block) in document.blocks.iter().enumerate() {
        let Block::Listing(listing) = block else { continue };
        let Some(language) = listing.language.as_deref() else { continue };
        let Some(eligible) = index.eligible(language) else { continue };

        let spec = ListingSpec::new(listing, language, eligible.is_result);
        let (found_langs, inserted) = resolve_listing(&spec, listing.scope.as_ref(), eligible, &mut merger, run);
        if found_langs.is_empty() {
            continue;
        }
        let tag_callout_list = explains(&document.blocks, position, listing.scope.as_ref())
            .then(|| return eligible.source_lang.to_string());
        splices.push(Splice { found_langs, inserted, position, tag_callout_list });
    }

    document.callout_lists = merger.last_index();
    apply(document, splices);
}

/// Load every configured alternative of one listing, record the outcome,
/// and return the languages found with their blocks ready to splice.
fn resolve_listing(
    spec: &ListingSpec<'_>,
    owner: Option<&CalloutScope>,
    eligible: Eligible<'_>,
    merger: &mut CalloutMerger,
    run: &mut RunState,
) -> (Vec<String>, Vec<Block>) {
    let digest = spec.digest(&mut run.digests).clone();
    log::debug!("{}: looking up alternatives for {}", spec.location, digest.file_name());

    let mut outcomes: Vec<(String, bool)> = Vec::new();
    let mut found_langs: Vec<String> = Vec::new();
    let mut inserted: Vec<Block> = Vec::new();

    for alternative in eligible.alternatives {
        let expected = if spec.is_result {
            format!("{}{RESULT_SUFFIX}", alternative.lang)
        } else {
            alternative.lang.clone()
        };
        match run.fragments.load(&alternative.dir, &digest, &expected, &mut run.diagnostics) {
            LoadResult::Found(mut fragment) => {
                merger.merge(owner, &mut fragment, found_langs.len(), &alternative.lang);
                for mut block in fragment.blocks {
                    if matches!(block, Block::Listing(_)) {
                        block.add_role("alternative");
                    }
                    inserted.push(block);
                }
                found_langs.push(alternative.lang.clone());
                outcomes.push((alternative.lang.clone(), true));
            },
            LoadResult::NotFound => outcomes.push((alternative.lang.clone(), false)),
        }
    }

    run.coverage.record_listing(
        eligible.source_lang,
        outcomes.iter().map(|(lang, found)| return (lang.as_str(), *found)),
    );
    run.report.push(ReportEntry {
        alternatives: outcomes,
        digest,
        is_result: spec.is_result,
        lang: spec.language.to_string(),
        location: spec.location.clone(),
        source: spec.source.to_string(),
    });

    return (found_langs, inserted);
}
