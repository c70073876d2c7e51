//! Keeps callout anchors unique when alternative fragments, each numbered
//! from 1 in their own file, are spliced next to the listing they translate.
//!
//! Visible numbers never change. Only the scope behind the anchor IDs does:
//! the original keeps `CO<index>-<n>`, the alternative attached at position
//! `k` becomes `A<k>-CO<index>-<n>` using the original's list index.

use std::collections::BTreeMap;

use crate::document::{Block, CalloutScope, Document};

/// Hands out callout list indices after those the host document already used.
#[derive(Debug)]
pub struct CalloutMerger {
    /// Highest index handed out so far.
    last_index: u32,
}

impl CalloutMerger {
    /// Highest index in use, to be written back to the document.
    pub const fn last_index(&self) -> u32 {
        return self.last_index;
    }

    /// Rescope every callout in `fragment` for attachment at `ordinal`
    /// (0-based among the alternatives attached to one listing).
    ///
    /// The fragment's first callout list shares the owner's index; any
    /// further lists in the fragment, or the first one when the owner has no
    /// callouts, get fresh indices. Callout lists are tagged `lang-<alt_lang>`.
    /// Counts are not compared with the owner: an alternative may have more,
    /// fewer, or no callouts.
    pub fn merge(&mut self, owner: Option<&CalloutScope>, fragment: &mut Document, ordinal: usize, alt_lang: &str) {
        let prefix = format!("A{ordinal}");
        let mut owner_index = owner.map(|scope| return scope.index);
        let mut remap: BTreeMap<u32, u32> = BTreeMap::new();

        for block in &mut fragment.blocks {
            let scope = match block {
                Block::Listing(listing) => listing.scope.as_mut(),
                Block::CalloutList(list) => list.scope.as_mut(),
                Block::Paragraph(_) | Block::Section(_) => None,
            };
            if let Some(scope) = scope {
                let local = scope.index;
                let index = *remap.entry(local).or_insert_with(|| {
                    return owner_index.take().unwrap_or_else(|| return self.next_index());
                });
                *scope = CalloutScope { index, prefix: Some(prefix.clone()) };
            }
            if matches!(block, Block::CalloutList(_)) {
                block.add_role(&format!("lang-{alt_lang}"));
            }
        }
    }

    /// Start after the indices `document` has already assigned.
    pub const fn new(document: &Document) -> Self {
        return Self { last_index: document.callout_lists };
    }

    const fn next_index(&mut self) -> u32 {
        self.last_index = self.last_index.saturating_add(1);
        return self.last_index;
    }
}
