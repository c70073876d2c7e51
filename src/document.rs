//! The parsed document tree: a flat sequence of tagged blocks.
//!
//! Only `Block::Listing` carries a language, so "is this an eligible code
//! listing" is a pattern match rather than an attribute probe.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::SourceLocation;

/// An attribute entry (`:name: value`) and where it was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    /// Line of the entry.
    pub location: SourceLocation,
    /// Trimmed value, possibly empty.
    pub value: String,
}

/// Any block the parser recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Numbered explanations for the callouts of the preceding listing.
    CalloutList(CalloutList),
    /// A delimited code listing.
    Listing(Listing),
    /// A run of prose lines.
    Paragraph(Paragraph),
    /// A section heading.
    Section(Section),
}

impl Block {
    /// Add a role unless it is already present.
    pub fn add_role(&mut self, role: &str) {
        let roles = match self {
            Block::CalloutList(list) => &mut list.roles,
            Block::Listing(listing) => &mut listing.roles,
            Block::Paragraph(para) => &mut para.roles,
            Block::Section(section) => &mut section.roles,
        };
        add_role(roles, role);
    }

    /// Where the block starts.
    pub const fn location(&self) -> &SourceLocation {
        return match self {
            Block::CalloutList(list) => &list.location,
            Block::Listing(listing) => &listing.location,
            Block::Paragraph(para) => &para.location,
            Block::Section(section) => &section.location,
        };
    }
}

/// One entry of a callout list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutItem {
    /// The number this item explains.
    pub number: u32,
    /// Explanation text, continuation lines joined with spaces.
    pub text: String,
}

/// A `<1> ...` list following a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutList {
    /// Items in source order.
    pub items: Vec<CalloutItem>,
    /// Line of the first item.
    pub location: SourceLocation,
    /// Marker numbers of the explained listing, in occurrence order.
    pub markers: Vec<u32>,
    /// Extra CSS roles.
    pub roles: Vec<String>,
    /// Shared with the listing this list explains.
    pub scope: Option<CalloutScope>,
}

/// Identifies the owner of a set of callouts, so anchor IDs stay unique
/// when listings parsed from different files share one output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutScope {
    /// Document-wide callout list number, 1-based.
    pub index: u32,
    /// `A0`, `A1`, … for alternatives; `None` for the original listing.
    pub prefix: Option<String>,
}

impl CalloutScope {
    /// Anchor ID for the `occurrence`-th marker (1-based) in the listing.
    pub fn anchor(&self, occurrence: usize) -> String {
        return match &self.prefix {
            Some(prefix) => format!("{prefix}-CO{}-{occurrence}", self.index),
            None => format!("CO{}-{occurrence}", self.index),
        };
    }
}

/// A parsed document or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Attribute entries, last assignment wins.
    pub attributes: BTreeMap<String, AttributeEntry>,
    /// Blocks in document order.
    pub blocks: Vec<Block>,
    /// Highest callout list index handed out so far.
    pub callout_lists: u32,
    /// File the document was read from.
    pub path: PathBuf,
    /// `= Title`, if the document has one.
    pub title: Option<String>,
}

impl Document {
    /// Empty document for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        return Self {
            attributes: BTreeMap::new(),
            blocks: Vec::new(),
            callout_lists: 0,
            path: path.into(),
            title: None,
        };
    }

    /// Value of an attribute, if set.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        return self.attributes.get(name).map(|entry| return entry.value.as_str());
    }

    /// Hand out the next document-wide callout list index.
    pub const fn next_callout_index(&mut self) -> u32 {
        self.callout_lists = self.callout_lists.saturating_add(1);
        return self.callout_lists;
    }
}

/// A delimited code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Callout marker numbers in occurrence order, `<3>` → 3.
    pub callouts: Vec<u32>,
    /// Declared language from `[source,<lang>]`.
    pub language: Option<String>,
    /// Line of the opening delimiter.
    pub location: SourceLocation,
    /// Extra CSS roles.
    pub roles: Vec<String>,
    /// Set when the body contains at least one callout.
    pub scope: Option<CalloutScope>,
    /// Raw body between the delimiters, lines joined with `\n`.
    pub source: String,
    /// `.Title` line above the block.
    pub title: Option<String>,
}

/// Prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// First line.
    pub location: SourceLocation,
    /// Extra CSS roles.
    pub roles: Vec<String>,
    /// Lines joined with `\n`.
    pub text: String,
    /// `.Title` line above the block.
    pub title: Option<String>,
}

/// A section heading. Sections are not nested; the level is kept for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Number of `=` minus one, so `==` is level 1.
    pub level: usize,
    /// Line of the heading.
    pub location: SourceLocation,
    /// Extra CSS roles.
    pub roles: Vec<String>,
    /// Heading text.
    pub title: String,
}

/// Push `role` unless already present.
pub fn add_role(roles: &mut Vec<String>, role: &str) {
    if !roles.iter().any(|r| return r == role) {
        roles.push(role.to_string());
    }
}

/// Split trailing callout markers off a listing line.
///
/// Returns the code with markers removed (and a dangling `//` or `#`
/// comment introducer dropped) plus the marker numbers left to right.
pub fn split_callouts(line: &str) -> (&str, Vec<u32>) {
    let mut rest = line.trim_end();
    let mut numbers = Vec::new();
    while let Some(without_gt) = rest.strip_suffix('>') {
        let Some(open) = without_gt.rfind('<') else { break };
        let (head, digits) = without_gt.split_at(open);
        let digits = digits.trim_start_matches('<');
        let Ok(number) = digits.parse::<u32>() else { break };
        if digits.is_empty() || !digits.bytes().all(|b| return b.is_ascii_digit()) {
            break;
        }
        numbers.push(number);
        rest = head.trim_end();
    }
    if numbers.is_empty() {
        return (line, numbers);
    }
    numbers.reverse();
    for introducer in ["//", "#", "--", ";;"] {
        if let Some(stripped) = rest.strip_suffix(introducer) {
            rest = stripped.trim_end();
            break;
        }
    }
    return (rest, numbers);
}
