//! Parser for the AsciiDoc subset altlookup converts.
//!
//! Parsing happens in two steps: a preprocessor expands `include::` lines
//! (tracking the file and line every resulting line came from), then a
//! block parser turns the flat line list into a `Document`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::document::{
    AttributeEntry, Block, CalloutItem, CalloutList, CalloutScope, Document, Listing,
    Paragraph, Section, split_callouts,
};
use crate::error::Error;
use crate::types::SourceLocation;

/// Nested includes deeper than this are dropped with an error.
const MAX_INCLUDE_DEPTH: usize = 64;

#[allow(clippy::expect_used, reason = "static pattern, validated by tests")]
static ATTRIBUTE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^:([A-Za-z0-9_][A-Za-z0-9_-]*):(?:\s+(.*))?$").expect("valid regex"));

#[allow(clippy::expect_used, reason = "static pattern, validated by tests")]
static ATTRIBUTE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\{([A-Za-z0-9_][A-Za-z0-9_-]*)\}").expect("valid regex"));

#[allow(clippy::expect_used, reason = "static pattern, validated by tests")]
static CALLOUT_ITEM: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^<(\d+)>\s+(.*)$").expect("valid regex"));

#[allow(clippy::expect_used, reason = "static pattern, validated by tests")]
static INCLUDE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^include::([^\[\s]+)\[[^\]]*\]\s*$").expect("valid regex"));

#[allow(clippy::expect_used, reason = "static pattern, validated by tests")]
static SECTION_TITLE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(={2,6})\s+(\S.*)$").expect("valid regex"));

/// What to do when an include target is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeMode {
    /// Replace the directive with a marker line and log an error.
    Lenient,
    /// Fail the parse with `Error::IncludeNotFound`.
    Strict,
}

/// A preprocessed line and where it came from.
#[derive(Debug, Clone)]
struct Line {
    /// Origin of the line, after include expansion.
    location: SourceLocation,
    /// Line text without the terminator.
    text: String,
}

/// Attributes, title and anchor collected above a block.
#[derive(Debug, Default)]
struct PendingMeta {
    /// Second positional attribute of `[source,<lang>]`.
    language: Option<String>,
    /// `role=` values and `.role` shorthands.
    roles: Vec<String>,
    /// Whether the first positional attribute was `source`.
    source_style: bool,
    /// `.Title`.
    title: Option<String>,
}

/// Block parser state over preprocessed lines.
struct BlockParser<'a> {
    diagnostics: &'a mut Diagnostics,
    document: Document,
    lines: Vec<Line>,
    pending: PendingMeta,
    position: usize,
}

impl BlockParser<'_> {
    /// Line at `position`, if any.
    fn current(&self) -> Option<&Line> {
        return self.lines.get(self.position);
    }

    /// Follow ` \` line continuations of an attribute value. Continued
    /// lines are joined with newlines so multi-record values survive.
    fn continue_attribute_value(&mut self, mut value: String) -> String {
        while let Some(stripped) = value.strip_suffix('\\') {
            let head = stripped.trim_end().to_string();
            let Some(next) = self.current() else {
                return head;
            };
            value = format!("{head}\n{}", next.text.trim());
            self.position = self.position.saturating_add(1);
        }
        return value;
    }

    /// Associate a callout list with the listing right before it and check
    /// that both agree on the callout numbers.
    fn finish_callout_list(&mut self, items: Vec<CalloutItem>, location: SourceLocation) {
        let owner = match self.document.blocks.last() {
            Some(Block::Listing(listing)) => Some(listing),
            _ => None,
        };
        let scope = owner.and_then(|listing| return listing.scope.clone());
        let markers: Vec<u32> = owner
            .map(|listing| return listing.callouts.clone())
            .unwrap_or_default();

        if owner.is_none() {
            self.diagnostics.warn(Some(&location), "callout list has no preceding listing");
        }
        for item in &items {
            if owner.is_some() && !markers.contains(&item.number) {
                self.diagnostics.warn(Some(&location), format!("no callout found for <{}>", item.number));
            }
        }
        let mut explained: Vec<u32> = Vec::new();
        for &number in &markers {
            if explained.contains(&number) {
                continue;
            }
            explained.push(number);
            if !items.iter().any(|item| return item.number == number) {
                self.diagnostics.warn(Some(&location), format!("callout <{number}> has no explanation"));
            }
        }

        let pending = std::mem::take(&mut self.pending);
        self.document.blocks.push(Block::CalloutList(CalloutList {
            items,
            location,
            markers,
            roles: pending.roles,
            scope,
        }));
    }

    /// Apply a `[...]` block attribute line to the pending metadata.
    fn parse_block_attributes(&mut self, inner: &str) {
        for (position, raw) in inner.split(',').enumerate() {
            let value = raw.trim().trim_matches('"');
            if let Some(role) = value.strip_prefix("role=") {
                for r in role.trim_matches('"').split_whitespace() {
                    self.pending.roles.push(r.to_string());
                }
                continue;
            }
            if value.contains('=') {
                continue;
            }
            match position {
                0 => {
                    let mut parts = value.split('.');
                    let style = parts.next().unwrap_or_default();
                    self.pending.source_style = style == "source";
                    for role in parts.filter(|r| return !r.is_empty()) {
                        self.pending.roles.push(role.to_string());
                    }
                },
                1 if self.pending.source_style && !value.is_empty() => {
                    self.pending.language = Some(value.to_string());
                },
                _ => {},
            }
        }
    }

    fn parse_callout_list(&mut self) {
        let Some(first) = self.current() else { return };
        let location = first.location.clone();
        let mut items: Vec<CalloutItem> = Vec::new();

        while let Some(line) = self.current() {
            let text = line.text.trim_end();
            if text.is_empty() {
                break;
            }
            if let Some(caps) = CALLOUT_ITEM.captures(text) {
                let number = caps.get(1).and_then(|m| return m.as_str().parse::<u32>().ok()).unwrap_or(0);
                let body = caps.get(2).map(|m| return m.as_str().trim().to_string()).unwrap_or_default();
                items.push(CalloutItem { number, text: body });
            } else if is_block_boundary(text) {
                break;
            } else if let Some(last) = items.last_mut() {
                last.text.push(' ');
                last.text.push_str(text.trim());
            }
            self.position = self.position.saturating_add(1);
        }

        self.finish_callout_list(items, location);
    }

    fn parse_document(mut self) -> Document {
        while let Some(line) = self.current() {
            let text = line.text.trim_end().to_string();
            let location = line.location.clone();

            if text.is_empty() {
                self.position = self.position.saturating_add(1);
                continue;
            }
            if text.starts_with("////") {
                self.skip_delimited(&text);
                continue;
            }
            if text.starts_with("//") {
                self.position = self.position.saturating_add(1);
                continue;
            }
            if let Some(caps) = ATTRIBUTE_ENTRY.captures(&text) {
                let name = caps.get(1).map(|m| return m.as_str().to_string()).unwrap_or_default();
                let value = caps.get(2).map(|m| return m.as_str().trim().to_string()).unwrap_or_default();
                self.position = self.position.saturating_add(1);
                let value = self.continue_attribute_value(value);
                self.document.attributes.insert(name, AttributeEntry { location, value });
                continue;
            }
            if let Some(title) = text.strip_prefix("= ")
                && self.document.title.is_none()
                && self.document.blocks.is_empty()
            {
                self.document.title = Some(title.trim().to_string());
                self.position = self.position.saturating_add(1);
                continue;
            }
            if let Some(caps) = SECTION_TITLE.captures(&text) {
                let level = caps.get(1).map(|m| return m.as_str().len().saturating_sub(1)).unwrap_or(1);
                let title = caps.get(2).map(|m| return m.as_str().trim().to_string()).unwrap_or_default();
                let pending = std::mem::take(&mut self.pending);
                self.document.blocks.push(Block::Section(Section {
                    level,
                    location,
                    roles: pending.roles,
                    title,
                }));
                self.position = self.position.saturating_add(1);
                continue;
            }
            if text.starts_with("[[") && text.ends_with("]]") {
                self.position = self.position.saturating_add(1);
                continue;
            }
            if let Some(inner) = text.strip_prefix('[').and_then(|t| return t.strip_suffix(']')) {
                self.parse_block_attributes(inner);
                self.position = self.position.saturating_add(1);
                continue;
            }
            if let Some(title) = text.strip_prefix('.')
                && !title.starts_with('.')
                && !title.starts_with(char::is_whitespace)
                && !title.is_empty()
            {
                self.pending.title = Some(title.to_string());
                self.position = self.position.saturating_add(1);
                continue;
            }
            if is_listing_delimiter(&text) {
                self.parse_listing(&text, location);
                continue;
            }
            if CALLOUT_ITEM.is_match(&text) {
                self.parse_callout_list();
                continue;
            }
            self.parse_paragraph(location);
        }
        return self.document;
    }

    fn parse_listing(&mut self, delimiter: &str, location: SourceLocation) {
        self.position = self.position.saturating_add(1);
        let mut body: Vec<String> = Vec::new();
        let mut closed = false;
        while let Some(line) = self.current() {
            if line.text.trim_end() == delimiter {
                closed = true;
                self.position = self.position.saturating_add(1);
                break;
            }
            body.push(line.text.clone());
            self.position = self.position.saturating_add(1);
        }
        if !closed {
            self.diagnostics.warn(Some(&location), "unterminated listing block");
        }

        let callouts: Vec<u32> = body
            .iter()
            .flat_map(|text| return split_callouts(text).1)
            .collect();
        let scope = if callouts.is_empty() {
            None
        } else {
            Some(CalloutScope { index: self.document.next_callout_index(), prefix: None })
        };

        let pending = std::mem::take(&mut self.pending);
        let language = if pending.source_style { pending.language } else { None };
        self.document.blocks.push(Block::Listing(Listing {
            callouts,
            language,
            location,
            roles: pending.roles,
            scope,
            source: body.join("\n"),
            title: pending.title,
        }));
    }

    fn parse_paragraph(&mut self, location: SourceLocation) {
        let mut text: Vec<String> = Vec::new();
        while let Some(line) = self.current() {
            let trimmed = line.text.trim_end();
            if trimmed.is_empty() || (!text.is_empty() && is_block_boundary(trimmed)) {
                break;
            }
            text.push(trimmed.to_string());
            self.position = self.position.saturating_add(1);
        }
        let pending = std::mem::take(&mut self.pending);
        self.document.blocks.push(Block::Paragraph(Paragraph {
            location,
            roles: pending.roles,
            text: text.join("\n"),
            title: pending.title,
        }));
    }

    /// Skip a delimited block whose content is ignored (`////` comments).
    fn skip_delimited(&mut self, delimiter: &str) {
        self.position = self.position.saturating_add(1);
        while let Some(line) = self.current() {
            let done = line.text.trim_end() == delimiter;
            self.position = self.position.saturating_add(1);
            if done {
                return;
            }
        }
    }
}

/// Include expansion state shared across nested files.
struct Preprocessor<'a> {
    attributes: BTreeMap<String, String>,
    diagnostics: &'a mut Diagnostics,
    mode: IncludeMode,
    out: Vec<Line>,
}

impl Preprocessor<'_> {
    /// Expand `content` (read from `path`) into `self.out`.
    fn expand(&mut self, path: &Path, content: &str, depth: usize) -> Result<(), Error> {
        for (index, raw) in content.lines().enumerate() {
            let location = SourceLocation::new(path, index.saturating_add(1));
            if let Some(caps) = ATTRIBUTE_ENTRY.captures(raw.trim_end()) {
                let name = caps.get(1).map(|m| return m.as_str().to_string()).unwrap_or_default();
                let value = caps.get(2).map(|m| return m.as_str().trim().to_string()).unwrap_or_default();
                self.attributes.insert(name, value);
            }
            let Some(caps) = INCLUDE_DIRECTIVE.captures(raw.trim_end()) else {
                self.out.push(Line { location, text: raw.to_string() });
                continue;
            };
            let raw_target = caps.get(1).map(|m| return m.as_str()).unwrap_or_default();
            let target = self.substitute(raw_target);
            self.include(path, &target, raw, location, depth)?;
        }
        return Ok(());
    }

    fn include(
        &mut self,
        from: &Path,
        target: &str,
        directive: &str,
        location: SourceLocation,
        depth: usize,
    ) -> Result<(), Error> {
        if depth >= MAX_INCLUDE_DEPTH {
            self.diagnostics.error(
                Some(&location),
                format!("maximum include depth of {MAX_INCLUDE_DEPTH} exceeded: {target}"),
            );
            return Ok(());
        }
        let base = from.parent().unwrap_or_else(|| return Path::new(""));
        let resolved = base.join(target);
        let err = match std::fs::read_to_string(&resolved) {
            Ok(nested) => return self.expand(&resolved, &nested, depth.saturating_add(1)),
            Err(e) => e,
        };
        let missing = err.kind() == std::io::ErrorKind::NotFound;
        match self.mode {
            IncludeMode::Strict if missing => {
                return Err(Error::IncludeNotFound { location, target: target.to_string() });
            },
            IncludeMode::Strict => return Err(Error::Io(err)),
            // Any unreadable target in a fragment degrades to the marker line.
            IncludeMode::Lenient => {
                let message = if missing {
                    format!("include file not found: {}", resolved.display())
                } else {
                    format!("include file unreadable: {}: {err}", resolved.display())
                };
                self.diagnostics.error(Some(&location), message);
                self.out.push(Line {
                    text: format!("Unresolved directive in {} - {}", from.display(), directive.trim_end()),
                    location,
                });
                return Ok(());
            },
        }
    }

    /// Replace `{name}` references with known attribute values; unknown
    /// references are left as written.
    fn substitute(&self, target: &str) -> String {
        return ATTRIBUTE_REFERENCE
            .replace_all(target, |caps: &regex::Captures<'_>| {
                let name = caps.get(1).map(|m| return m.as_str()).unwrap_or_default();
                return match self.attributes.get(name) {
                    Some(value) => value.clone(),
                    None => caps.get(0).map(|m| return m.as_str().to_string()).unwrap_or_default(),
                };
            })
            .into_owned();
    }
}

/// Whether `text` starts a new block and so ends a paragraph or list.
fn is_block_boundary(text: &str) -> bool {
    return is_listing_delimiter(text)
        || text.starts_with("////")
        || (text.starts_with('[') && text.ends_with(']'))
        || SECTION_TITLE.is_match(text);
}

/// `----`, `-----`, ... on a line of their own.
fn is_listing_delimiter(text: &str) -> bool {
    return text.len() >= 4 && text.bytes().all(|b| return b == b'-');
}

/// Read and parse a document from disk.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if `path` is missing, `Error::Io` on other
/// read failures, and `Error::IncludeNotFound` for a missing include in
/// `IncludeMode::Strict`.
pub fn parse_file(path: &Path, mode: IncludeMode, diagnostics: &mut Diagnostics) -> Result<Document, Error> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound { path: path.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
    };
    return parse_str(path, &content, mode, diagnostics);
}

/// Parse `content` as if it had been read from `path`.
///
/// # Errors
///
/// Returns `Error::IncludeNotFound` for a missing include in
/// `IncludeMode::Strict`, or `Error::Io` if an include cannot be read.
pub fn parse_str(
    path: &Path,
    content: &str,
    mode: IncludeMode,
    diagnostics: &mut Diagnostics,
) -> Result<Document, Error> {
    let mut attributes = BTreeMap::new();
    if let Some(dir) = path.parent() {
        attributes.insert("docdir".to_string(), dir.display().to_string());
    }
    let mut pre = Preprocessor { attributes, diagnostics, mode, out: Vec::new() };
    pre.expand(path, content, 0)?;
    let lines = pre.out;

    let parser = BlockParser {
        diagnostics,
        document: Document::new(PathBuf::from(path)),
        lines,
        pending: PendingMeta::default(),
        position: 0,
    };
    return Ok(parser.parse_document());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn parse(content: &str) -> (Document, Diagnostics) {
        let mut diags = Diagnostics::default();
        let doc = parse_str(Path::new("doc.adoc"), content, IncludeMode::Strict, &mut diags).unwrap();
        return (doc, diags);
    }

    fn listings(doc: &Document) -> Vec<&Listing> {
        return doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Listing(l) => Some(l),
                _ => None,
            })
            .collect();
    }

    #[test]
    fn parses_title_attributes_and_sections() {
        let (doc, _) = parse("= Guide\n:lookups: x\n\n== Intro\n\nHello\nworld\n");
        assert_eq!(doc.title.as_deref(), Some("Guide"));
        assert_eq!(doc.attribute("lookups"), Some("x"));
        assert_eq!(doc.blocks.len(), 2);
        let Some(Block::Paragraph(p)) = doc.blocks.get(1) else { panic!("expected paragraph") };
        assert_eq!(p.text, "Hello\nworld");
        assert_eq!(p.location.line, 6);
    }

    #[test]
    fn attribute_values_continue_across_lines() {
        let (doc, _) = parse(":lookups: console,js,a \\\nconsole,java,b\n\nText\n");
        assert_eq!(doc.attribute("lookups"), Some("console,js,a\nconsole,java,b"));
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn parses_source_listing_with_language_and_location() {
        let (doc, _) = parse("Intro\n\n[source,console]\n----\nGET /_search\n----\n");
        let found = listings(&doc);
        assert_eq!(found.len(), 1);
        let listing = found.first().unwrap();
        assert_eq!(listing.language.as_deref(), Some("console"));
        assert_eq!(listing.source, "GET /_search");
        assert_eq!(listing.location.line, 4);
    }

    #[test]
    fn plain_listing_has_no_language() {
        let (doc, _) = parse("----\nraw\n----\n");
        assert_eq!(listings(&doc).first().unwrap().language, None);
    }

    #[test]
    fn listing_keeps_blank_lines_and_longer_delimiters() {
        let (doc, _) = parse("[source,js]\n------\na\n\n----\nb\n------\n");
        assert_eq!(listings(&doc).first().unwrap().source, "a\n\n----\nb");
    }

    #[test]
    fn callouts_share_scope_with_following_list() {
        let (doc, diags) = parse(
            "[source,console]\n----\nGET / <1>\nPUT / <2>\n----\n<1> First\n<2> Second\ncontinued\n\n[source,console]\n----\nDELETE / <1>\n----\n<1> Third\n",
        );
        assert_eq!(diags.entries().len(), 0);
        assert_eq!(doc.callout_lists, 2);
        let Some(Block::CalloutList(list)) = doc.blocks.get(1) else { panic!("expected list") };
        assert_eq!(list.scope, Some(CalloutScope { index: 1, prefix: None }));
        assert_eq!(list.items.get(1).unwrap().text, "Second continued");
        let Some(Block::CalloutList(second)) = doc.blocks.get(3) else { panic!("expected list") };
        assert_eq!(second.scope.as_ref().unwrap().index, 2);
    }

    #[test]
    fn mismatched_callouts_warn() {
        let (_, diags) = parse("[source,js]\n----\na <1>\n----\n<2> Missing\n");
        assert_eq!(diags.count(Severity::Warning), 2);
        let messages: Vec<&str> = diags.entries().iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"no callout found for <2>"));
        assert!(messages.contains(&"callout <1> has no explanation"));
    }

    #[test]
    fn role_and_title_attach_to_next_block() {
        let (doc, _) = parse(".Request\n[source,console,role=snippet]\n----\nGET /\n----\n");
        let listing = listings(&doc).into_iter().next().unwrap().clone();
        assert_eq!(listing.title.as_deref(), Some("Request"));
        assert_eq!(listing.roles, vec!["snippet"]);
        assert_eq!(listing.language.as_deref(), Some("console"));
    }

    #[test]
    fn comments_are_skipped() {
        let (doc, _) = parse("// hidden\n////\n----\n////\nVisible\n");
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn include_is_expanded_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("parts")).unwrap();
        std::fs::write(dir.path().join("parts/body.adoc"), "[source,js]\n----\nconst a = 1;\n----\n").unwrap();
        let main = dir.path().join("main.adoc");
        std::fs::write(&main, "Intro\n\ninclude::parts/body.adoc[]\n").unwrap();

        let mut diags = Diagnostics::default();
        let doc = parse_file(&main, IncludeMode::Strict, &mut diags).unwrap();
        let listing = listings(&doc).into_iter().next().unwrap().clone();
        assert_eq!(listing.source, "const a = 1;");
        assert_eq!(listing.location, SourceLocation::new(dir.path().join("parts/body.adoc"), 2));
    }

    #[test]
    fn include_target_substitutes_attributes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snippet.adoc"), "Included text\n").unwrap();
        let main = dir.path().join("main.adoc");
        std::fs::write(&main, "include::{docdir}/snippet.adoc[]\n").unwrap();

        let mut diags = Diagnostics::default();
        let doc = parse_file(&main, IncludeMode::Strict, &mut diags).unwrap();
        let Some(Block::Paragraph(p)) = doc.blocks.first() else { panic!("expected paragraph") };
        assert_eq!(p.text, "Included text");
    }

    #[test]
    fn strict_missing_include_fails() {
        let mut diags = Diagnostics::default();
        let err = parse_str(Path::new("main.adoc"), "include::nope.adoc[]\n", IncludeMode::Strict, &mut diags)
            .unwrap_err();
        assert!(matches!(err, Error::IncludeNotFound { ref target, .. } if target == "nope.adoc"));
    }

    #[test]
    fn lenient_missing_include_leaves_marker_and_error() {
        let mut diags = Diagnostics::default();
        let doc = parse_str(
            Path::new("alt/abc.adoc"),
            "[source,js]\n----\ninclude::nope.js[]\n----\n",
            IncludeMode::Lenient,
            &mut diags,
        )
        .unwrap();
        assert_eq!(diags.count(Severity::Error), 1);
        assert_eq!(diags.entries().first().unwrap().location, Some(SourceLocation::new("alt/abc.adoc", 3)));
        let listing = listings(&doc).into_iter().next().unwrap().clone();
        assert_eq!(listing.source, "Unresolved directive in alt/abc.adoc - include::nope.js[]");
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let mut diags = Diagnostics::default();
        let err = parse_file(Path::new("/definitely/not/here.adoc"), IncludeMode::Strict, &mut diags).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
